//! Defines the endpoint for listing the goals the user is still saving for.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use crate::{
    db::lock_connection,
    goal::{GoalState, get_incomplete_goals},
    user::get_or_create_user,
};

/// A route handler for getting the incomplete goals, newest first.
pub async fn get_goals_endpoint(State(state): State<GoalState>) -> Response {
    let result = lock_connection(&state.db_connection).and_then(|connection| {
        let user = get_or_create_user(&state.default_user, OffsetDateTime::now_utc(), &connection)?;
        get_incomplete_goals(user.id, &connection)
    });

    match result {
        Ok(goals) => Json(goals).into_response(),
        Err(error) => error.into_json_response("Failed to get goals"),
    }
}
