//! Defines the endpoint for listing the user's recent transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, DefaultUser, Transaction, db::lock_connection, json::ApiQuery,
    ledger::is_undoable, transaction::get_recent_transactions, user::get_or_create_user,
};

/// How many transactions are returned when the client does not ask for a number.
pub const DEFAULT_TRANSACTION_LIMIT: u32 = 10;
/// The most transactions returned by one request.
pub const MAX_TRANSACTION_LIMIT: u32 = 100;

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct TransactionListState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The account that requests operate on.
    pub default_user: DefaultUser,
}

impl FromRef<AppState> for TransactionListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            default_user: state.default_user.clone(),
        }
    }
}

/// The query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListQuery {
    /// How many transactions to return, clamped to `1..=100`.
    pub limit: Option<u32>,
}

/// A transaction as listed to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionView {
    #[serde(flatten)]
    transaction: Transaction,
    /// Whether the transaction is still inside the undo window.
    can_undo: bool,
}

/// A route handler for getting the most recent transactions, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionListState>,
    ApiQuery(query): ApiQuery<TransactionListQuery>,
) -> Response {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
        .clamp(1, MAX_TRANSACTION_LIMIT);
    let now = OffsetDateTime::now_utc();

    let result = lock_connection(&state.db_connection).and_then(|connection| {
        let user = get_or_create_user(&state.default_user, now, &connection)?;
        get_recent_transactions(user.id, limit, &connection)
    });

    match result {
        Ok(transactions) => {
            let views: Vec<TransactionView> = transactions
                .into_iter()
                .map(|transaction| TransactionView {
                    can_undo: is_undoable(&transaction, now),
                    transaction,
                })
                .collect();

            Json(views).into_response()
        }
        Err(error) => error.into_json_response("Failed to get transactions"),
    }
}
