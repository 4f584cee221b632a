//! Defines the endpoint for editing a goal.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use crate::{
    db::lock_connection,
    goal::{GoalForm, GoalId, GoalState, update_goal},
    json::ApiJson,
    user::get_or_create_user,
};

/// A route handler for changing a goal's name, description or target, responds with the updated goal.
pub async fn update_goal_endpoint(
    Path(goal_id): Path<GoalId>,
    State(state): State<GoalState>,
    ApiJson(form): ApiJson<GoalForm>,
) -> Response {
    let result = form.into_update().and_then(|update| {
        let connection = lock_connection(&state.db_connection)?;
        let user = get_or_create_user(&state.default_user, OffsetDateTime::now_utc(), &connection)?;

        update_goal(user.id, goal_id, update, &connection)
    });

    match result {
        Ok(goal) => Json(goal).into_response(),
        Err(error) => error.into_json_response("Failed to update goal"),
    }
}
