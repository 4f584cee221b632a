//! Defines the endpoint for creating a new goal.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use crate::{
    db::lock_connection,
    goal::{GoalForm, GoalState, create_goal},
    json::ApiJson,
    user::get_or_create_user,
};

/// A route handler for creating a new goal, responds with the created goal.
pub async fn create_goal_endpoint(
    State(state): State<GoalState>,
    ApiJson(form): ApiJson<GoalForm>,
) -> Response {
    let result = form.into_new_goal().and_then(|new_goal| {
        let connection = lock_connection(&state.db_connection)?;
        let now = OffsetDateTime::now_utc();
        let user = get_or_create_user(&state.default_user, now, &connection)?;

        create_goal(user.id, new_goal, now, &connection)
    });

    match result {
        Ok(goal) => {
            tracing::info!("Created goal {} \"{}\"", goal.id, goal.name);
            Json(goal).into_response()
        }
        Err(error) => error.into_json_response("Failed to create goal"),
    }
}
