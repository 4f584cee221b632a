//! Defines the endpoint for claiming the payment for a chore.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use crate::{
    chore::{ChoreId, ChoreState},
    db::lock_connection,
    ledger::claim_chore,
    user::get_or_create_user,
};

/// A route handler for claiming a chore, responds with the new transaction and balance.
pub async fn claim_chore_endpoint(
    Path(chore_id): Path<ChoreId>,
    State(state): State<ChoreState>,
) -> Response {
    let result = lock_connection(&state.db_connection).and_then(|connection| {
        let now = OffsetDateTime::now_utc();
        let user = get_or_create_user(&state.default_user, now, &connection)?;
        claim_chore(user.id, chore_id, now, &connection)
    });

    match result {
        Ok(claim) => Json(claim).into_response(),
        Err(error) => error.into_json_response("Failed to claim chore"),
    }
}
