#![allow(missing_docs)]

use axum::response::Response;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{AppState, DefaultUser, PasswordHash, User, user::get_or_create_user};

/// Create app state backed by an empty in-memory database.
///
/// The password hash is not a real bcrypt hash so that tests stay fast.
pub(crate) fn get_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");

    AppState::new(
        connection,
        DefaultUser::new(
            DefaultUser::DEFAULT_USERNAME,
            PasswordHash::new_unchecked("hunter2"),
        ),
    )
    .expect("Could not create app state")
}

/// Get the default user of `state`, creating it if needed.
pub(crate) fn must_get_default_user(state: &AppState, connection: &Connection) -> User {
    get_or_create_user(&state.default_user, OffsetDateTime::now_utc(), connection)
        .expect("Could not get default user")
}

pub(crate) async fn parse_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    serde_json::from_slice(&body).expect("Response body is not valid JSON")
}
