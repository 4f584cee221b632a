//! Code for creating the user table, fetching users from the database and the
//! endpoint that returns the current user.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AppState, DefaultUser, Error, Money, PasswordHash, db::lock_connection};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// The password hash is never sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The unique name of the user.
    pub username: String,
    /// The user's password hash.
    #[serde(skip)]
    pub password_hash: PasswordHash,
    /// The money the user has not yet allocated to a goal.
    pub total_balance: Money,
    /// When the user was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                total_balance TEXT NOT NULL DEFAULT '0.00',
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user with a zero balance into the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred, e.g. the
/// username is already taken.
pub fn create_user(
    username: &str,
    password_hash: PasswordHash,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .prepare(
            "INSERT INTO user (username, password, total_balance, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, username, password, total_balance, created_at",
        )?
        .query_row(
            (username, password_hash.as_ref(), Money::zero(), created_at),
            map_row_to_user,
        )
        .map_err(Error::from)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a user ([Error::UserNotFound]),
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, password, total_balance, created_at FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id.as_i64())], map_row_to_user)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UserNotFound,
            error => error.into(),
        })
}

/// Get the user with `username`, if there is one.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<Option<User>, Error> {
    connection
        .prepare(
            "SELECT id, username, password, total_balance, created_at
             FROM user WHERE username = :username",
        )?
        .query_row(&[(":username", &username)], map_row_to_user)
        .optional()
        .map_err(Error::from)
}

/// Get the default user, creating it with a zero balance if it does not exist yet.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_or_create_user(
    default_user: &DefaultUser,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<User, Error> {
    if let Some(user) = get_user_by_username(&default_user.username, connection)? {
        return Ok(user);
    }

    tracing::info!("Creating default user \"{}\"", default_user.username);

    create_user(
        &default_user.username,
        default_user.password_hash.clone(),
        now,
        connection,
    )
}

/// Overwrite the balance of a user.
///
/// # Errors
///
/// Returns [Error::UserNotFound] if `user_id` does not refer to a user.
pub fn set_user_balance(
    user_id: UserId,
    balance: Money,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET total_balance = ?1 WHERE id = ?2",
        (balance, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UserNotFound);
    }

    Ok(())
}

fn map_row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserId::new(row.get(0)?),
        username: row.get(1)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        total_balance: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// The state needed to get the current user.
#[derive(Debug, Clone)]
pub struct UserState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The account that requests operate on.
    pub default_user: DefaultUser,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            default_user: state.default_user.clone(),
        }
    }
}

/// A route handler for getting the current user, creating it on first access.
pub async fn get_user_endpoint(State(state): State<UserState>) -> Response {
    let result = lock_connection(&state.db_connection).and_then(|connection| {
        get_or_create_user(&state.default_user, OffsetDateTime::now_utc(), &connection)
    });

    match result {
        Ok(user) => Json(user).into_response(),
        Err(error) => error.into_json_response("Failed to get user data"),
    }
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    use crate::{
        DefaultUser, Error, Money, PasswordHash,
        user::{
            UserId, create_user, create_user_table, get_or_create_user, get_user_by_id,
            get_user_by_username, set_user_balance,
        },
    };

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();
        let password_hash = PasswordHash::new_unchecked("hunter2");

        let inserted_user = create_user(
            "kid",
            password_hash.clone(),
            datetime!(2025-01-01 12:00 UTC),
            &db_connection,
        )
        .unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.username, "kid");
        assert_eq!(inserted_user.password_hash, password_hash);
        assert_eq!(inserted_user.total_balance, Money::zero());
        assert_eq!(inserted_user.created_at, datetime!(2025-01-01 12:00 UTC));
    }

    #[test]
    fn insert_fails_on_duplicate_username() {
        let db_connection = get_db_connection();
        let now = datetime!(2025-01-01 12:00 UTC);
        create_user("kid", PasswordHash::new_unchecked("a"), now, &db_connection).unwrap();

        let result = create_user("kid", PasswordHash::new_unchecked("b"), now, &db_connection);

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        let id = UserId::new(42);

        assert_eq!(get_user_by_id(id, &db_connection), Err(Error::UserNotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let test_user = create_user(
            "kid",
            PasswordHash::new_unchecked("hunter2"),
            datetime!(2025-01-01 12:00 UTC),
            &db_connection,
        )
        .unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_username_returns_none_when_missing() {
        let db_connection = get_db_connection();

        assert_eq!(get_user_by_username("nobody", &db_connection), Ok(None));
    }

    #[test]
    fn get_or_create_creates_user_once() {
        let db_connection = get_db_connection();
        let default_user = DefaultUser::new("kid", PasswordHash::new_unchecked("hunter2"));
        let now = datetime!(2025-01-01 12:00 UTC);

        let first = get_or_create_user(&default_user, now, &db_connection).unwrap();
        let second = get_or_create_user(&default_user, now, &db_connection).unwrap();

        assert_eq!(first, second);
        let count: i64 = db_connection
            .query_row("SELECT COUNT(id) FROM user", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn set_balance_updates_user() {
        let db_connection = get_db_connection();
        let user = create_user(
            "kid",
            PasswordHash::new_unchecked("hunter2"),
            datetime!(2025-01-01 12:00 UTC),
            &db_connection,
        )
        .unwrap();

        set_user_balance(user.id, Money::new(dec!(12.5)), &db_connection).unwrap();

        let got = get_user_by_id(user.id, &db_connection).unwrap();
        assert_eq!(got.total_balance.to_string(), "12.50");
    }

    #[test]
    fn set_balance_fails_for_missing_user() {
        let db_connection = get_db_connection();

        let result = set_user_balance(UserId::new(7), Money::zero(), &db_connection);

        assert_eq!(result, Err(Error::UserNotFound));
    }
}
