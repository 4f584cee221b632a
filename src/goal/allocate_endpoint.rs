//! Defines the endpoint for moving money from the balance into a goal.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use crate::{
    db::lock_connection,
    goal::{AllocationForm, GoalState},
    json::ApiJson,
    ledger::allocate_to_goal,
    user::get_or_create_user,
};

/// A route handler for allocating money to a goal, responds with the new
/// transaction, balance and goal.
pub async fn allocate_to_goal_endpoint(
    State(state): State<GoalState>,
    ApiJson(form): ApiJson<AllocationForm>,
) -> Response {
    let result = form.into_allocation().and_then(|allocation| {
        let connection = lock_connection(&state.db_connection)?;
        let now = OffsetDateTime::now_utc();
        let user = get_or_create_user(&state.default_user, now, &connection)?;

        allocate_to_goal(user.id, allocation.goal_id, allocation.amount, now, &connection)
    });

    match result {
        Ok(allocation) => Json(allocation).into_response(),
        Err(error) => error.into_json_response("Failed to allocate money"),
    }
}
