//! Defines the endpoint for listing the user's active chores.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use crate::{
    chore::{ChoreState, get_active_chores},
    db::lock_connection,
    user::get_or_create_user,
};

/// A route handler for getting the active chores, newest first.
pub async fn get_chores_endpoint(State(state): State<ChoreState>) -> Response {
    let result = lock_connection(&state.db_connection).and_then(|connection| {
        let user = get_or_create_user(&state.default_user, OffsetDateTime::now_utc(), &connection)?;
        get_active_chores(user.id, &connection)
    });

    match result {
        Ok(chores) => Json(chores).into_response(),
        Err(error) => error.into_json_response("Failed to get chores"),
    }
}
