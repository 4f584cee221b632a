//! Defines the endpoint for undoing a recent transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, DefaultUser, TransactionId, db::lock_connection, ledger::undo_transaction,
    message::MessageResponse, user::get_or_create_user,
};

/// The state needed to undo a transaction.
#[derive(Debug, Clone)]
pub struct UndoTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The account that requests operate on.
    pub default_user: DefaultUser,
}

impl FromRef<AppState> for UndoTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            default_user: state.default_user.clone(),
        }
    }
}

/// A route handler for undoing a transaction, responds with a message.
pub async fn undo_transaction_endpoint(
    State(state): State<UndoTransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let result = lock_connection(&state.db_connection).and_then(|connection| {
        let now = OffsetDateTime::now_utc();
        let user = get_or_create_user(&state.default_user, now, &connection)?;
        undo_transaction(user.id, transaction_id, now, &connection)
    });

    match result {
        Ok(()) => MessageResponse::new("Transaction undone successfully").into_response(),
        Err(error) => error.into_json_response("Failed to undo transaction"),
    }
}
