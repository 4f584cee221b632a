//! Defines the endpoint that wipes all of the user's data.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, DefaultUser, db::lock_connection, ledger::complete_reset, message::MessageResponse,
    user::get_or_create_user,
};

/// The state needed to reset the user's data.
#[derive(Debug, Clone)]
pub struct ResetState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The account that requests operate on.
    pub default_user: DefaultUser,
}

impl FromRef<AppState> for ResetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            default_user: state.default_user.clone(),
        }
    }
}

/// A route handler for deleting every chore, goal and transaction of the user
/// and setting their balance to zero.
///
/// The request body is ignored.
pub async fn reset_endpoint(State(state): State<ResetState>) -> Response {
    let result = lock_connection(&state.db_connection).and_then(|connection| {
        let user = get_or_create_user(&state.default_user, OffsetDateTime::now_utc(), &connection)?;
        complete_reset(user.id, &connection)
    });

    match result {
        Ok(()) => MessageResponse::new("Complete reset successful").into_response(),
        Err(error) => error.into_json_response("Failed to reset data"),
    }
}
