//! Pocket Money is a web app for children to track the money they earn from
//! chores and save toward goals.
//!
//! This library provides a JSON REST API over a SQLite database. The
//! operations that move money between the balance, goals and the transaction
//! history live in [ledger].

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod app_state;
mod chore;
mod db;
mod endpoints;
mod goal;
mod json;
pub mod ledger;
mod logging;
mod message;
mod money;
mod not_found;
mod password;
mod reset;
mod routing;
mod transaction;
mod user;
mod validation;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, DefaultUser};
pub use chore::{Chore, ChoreIcon, ChoreId, NewChore, create_chore};
pub use db::initialize as initialize_db;
pub use goal::{Goal, GoalId, NewGoal, create_goal};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::Money;
pub use password::PasswordHash;
pub use routing::build_router;
pub use transaction::{Transaction, TransactionId, TransactionType};
pub use user::{User, UserId, get_or_create_user};

use crate::{message::ErrorResponse, validation::ValidationErrors};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
///
/// The messages of the domain errors are shown to the user by the client, so
/// they should be kept stable.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more fields in a request body failed validation.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The request body could not be parsed as JSON of the expected shape.
    #[error("Invalid request body: {0}")]
    InvalidJson(String),

    /// The query string could not be parsed into the expected parameters.
    #[error("Invalid query parameters: {0}")]
    InvalidQuery(String),

    /// A string could not be parsed as an amount of money.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// A transaction type stored in the database is not one this version knows about.
    #[error("unknown transaction type \"{0}\"")]
    InvalidTransactionType(String),

    /// The chore does not exist, or it belongs to another user.
    #[error("Chore not found")]
    ChoreNotFound,

    /// The chore has been deleted and can no longer be claimed.
    #[error("Chore is no longer active")]
    InactiveChore,

    /// The goal does not exist, or it belongs to another user.
    #[error("Goal not found")]
    GoalNotFound,

    /// The user does not exist.
    #[error("User not found")]
    UserNotFound,

    /// The transaction does not exist, e.g. because it was already undone.
    #[error("Transaction not found or unauthorized")]
    TransactionNotFound,

    /// The transaction belongs to a different user.
    ///
    /// This shares its message with [Error::TransactionNotFound] so that clients
    /// cannot probe for other users' transactions.
    #[error("Transaction not found or unauthorized")]
    Unauthorized,

    /// An allocation asked for more money than the user's balance.
    #[error("Insufficient balance")]
    InsufficientFunds,

    /// The transaction is older than the undo window.
    #[error("Cannot undo transactions older than 24 hours")]
    UndoExpired,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidJson(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidQuery(rejection.body_text())
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_)
            | Error::InvalidJson(_)
            | Error::InvalidQuery(_)
            | Error::InvalidAmount(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::ChoreNotFound
            | Error::GoalNotFound
            | Error::UserNotFound
            | Error::TransactionNotFound
            | Error::NotFound => StatusCode::NOT_FOUND,
            Error::Unauthorized => StatusCode::FORBIDDEN,
            Error::InsufficientFunds | Error::UndoExpired | Error::InactiveChore => {
                StatusCode::CONFLICT
            }
            Error::InvalidTransactionType(_)
            | Error::HashingError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert the error into a JSON response.
    ///
    /// Errors that are not meant for the client (SQL errors, lock errors and
    /// the like) are logged and replaced with `failure_message`, e.g. "Failed
    /// to get chores".
    pub(crate) fn into_json_response(self, failure_message: &str) -> Response {
        let status_code = self.status_code();

        let body = match self {
            Error::Validation(errors) => ErrorResponse {
                message: errors.to_string(),
                errors: errors.errors,
            },
            error if status_code == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("{failure_message}: {error}");
                ErrorResponse::new(failure_message)
            }
            error => ErrorResponse::new(&error.to_string()),
        };

        (status_code, Json(body)).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.into_json_response(
            "An unexpected error occurred, check the server logs for more details.",
        )
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{
        Error,
        test_utils::parse_json,
        validation::{FieldError, ValidationErrors},
    };

    #[tokio::test]
    async fn domain_errors_keep_their_message() {
        let response = Error::InsufficientFunds.into_json_response("Failed to allocate money");

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = parse_json(response).await;
        assert_eq!(body["message"], "Insufficient balance");
    }

    #[tokio::test]
    async fn internal_errors_use_failure_message() {
        let response = Error::DatabaseLockError.into_json_response("Failed to get chores");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = parse_json(response).await;
        assert_eq!(body["message"], "Failed to get chores");
    }

    #[tokio::test]
    async fn validation_errors_list_fields() {
        let errors = ValidationErrors {
            subject: "chore",
            errors: vec![FieldError::new("name", "Name is required")],
        };

        let response = Error::Validation(errors).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_json(response).await;
        assert_eq!(body["message"], "Invalid chore data");
        assert_eq!(body["errors"][0]["field"], "name");
        assert_eq!(body["errors"][0]["message"], "Name is required");
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[test]
    fn unauthorized_shares_message_with_not_found() {
        assert_eq!(
            Error::Unauthorized.to_string(),
            Error::TransactionNotFound.to_string()
        );
    }
}
