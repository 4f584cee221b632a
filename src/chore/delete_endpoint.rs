//! Defines the endpoint for deleting a chore.
//!
//! Chores are soft-deleted so that transactions for past claims still refer
//! to an existing chore.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use crate::{
    chore::{ChoreId, ChoreState, deactivate_chore},
    db::lock_connection,
    message::MessageResponse,
    user::get_or_create_user,
};

/// A route handler for deleting a chore, responds with a message.
pub async fn delete_chore_endpoint(
    Path(chore_id): Path<ChoreId>,
    State(state): State<ChoreState>,
) -> Response {
    let result = lock_connection(&state.db_connection).and_then(|connection| {
        let user = get_or_create_user(&state.default_user, OffsetDateTime::now_utc(), &connection)?;
        deactivate_chore(user.id, chore_id, &connection)
    });

    match result {
        Ok(()) => {
            tracing::info!("Deactivated chore {chore_id}");
            MessageResponse::new("Chore deleted successfully").into_response()
        }
        Err(error) => error.into_json_response("Failed to delete chore"),
    }
}
