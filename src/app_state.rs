//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, PasswordHash, db::initialize};

/// The account that every request operates on.
///
/// The app has no sign-in, so the user is looked up by `username` on each
/// request and created with `password_hash` the first time it is missing.
#[derive(Debug, Clone)]
pub struct DefaultUser {
    /// The username of the default account, e.g. "kid".
    pub username: String,
    /// The password hash given to the account when it is created.
    pub password_hash: PasswordHash,
}

impl DefaultUser {
    /// The username used when none is configured.
    pub const DEFAULT_USERNAME: &'static str = "kid";

    /// Create the default user settings.
    pub fn new(username: &str, password_hash: PasswordHash) -> Self {
        Self {
            username: username.to_owned(),
            password_hash,
        }
    }
}

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection.
    ///
    /// Handlers hold the lock for the whole of a request's store calls, which
    /// serializes every ledger operation.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The account that requests operate on.
    pub default_user: DefaultUser,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, default_user: DefaultUser) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            default_user,
        })
    }
}
