//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, Money, UserId, chore::ChoreId, goal::GoalId};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for a transaction.
pub type TransactionId = i64;

/// What caused money to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// A chore was claimed and its payment added to the balance.
    ChoreCompleted,
    /// Money was moved from the balance into a goal.
    GoalAllocation,
}

impl TransactionType {
    /// The name of the type as stored in the database and sent to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::ChoreCompleted => "chore_completed",
            TransactionType::GoalAllocation => "goal_allocation",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chore_completed" => Ok(TransactionType::ChoreCompleted),
            "goal_allocation" => Ok(TransactionType::GoalAllocation),
            other => Err(Error::InvalidTransactionType(other.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        TransactionType::from_str(text).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A change to a user's balance.
///
/// The amount is signed: chore payments are positive and goal allocations are
/// negative, so the sum of a user's transactions is their balance.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user whose balance changed.
    pub user_id: UserId,
    /// What caused the change.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The signed amount added to the balance.
    pub amount: Money,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The chore that was claimed, if any.
    pub chore_id: Option<ChoreId>,
    /// The goal money was allocated to, if any.
    pub goal_id: Option<GoalId>,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(kind: TransactionType, amount: Money, description: &str) -> TransactionBuilder {
        TransactionBuilder {
            kind,
            amount,
            description: description.to_owned(),
            chore_id: None,
            goal_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The chore and goal references are informational only: a transaction stays
/// valid after its chore is deactivated or its goal is deleted.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// What caused the change.
    pub kind: TransactionType,

    /// The signed amount added to the balance.
    pub amount: Money,

    /// A human-readable description of the transaction, e.g. "Completed: Feed the dog".
    pub description: String,

    /// The chore that was claimed.
    pub chore_id: Option<ChoreId>,

    /// The goal money was allocated to.
    pub goal_id: Option<GoalId>,
}

impl TransactionBuilder {
    /// Set the chore the transaction refers to.
    pub fn chore_id(mut self, chore_id: ChoreId) -> Self {
        self.chore_id = Some(chore_id);
        self
    }

    /// Set the goal the transaction refers to.
    pub fn goal_id(mut self, goal_id: GoalId) -> Self {
        self.goal_id = Some(goal_id);
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_COLUMNS: &str =
    "id, user_id, type, amount, description, chore_id, goal_id, created_at";

/// Create the transaction table and its indexes.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES user(id),
            type TEXT NOT NULL,
            amount TEXT NOT NULL,
            description TEXT NOT NULL,
            chore_id INTEGER,
            goal_id INTEGER,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_created
            ON \"transaction\"(user_id, created_at);",
    )?;

    Ok(())
}

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn create_transaction(
    user_id: UserId,
    builder: TransactionBuilder,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, type, amount, description, chore_id, goal_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {SELECT_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                builder.kind,
                builder.amount,
                builder.description,
                builder.chore_id,
                builder.goal_id,
                created_at,
            ),
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Retrieve a transaction by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound,
            error => error.into(),
        })
}

/// Retrieve the `limit` most recent transactions of a user, newest first.
pub fn get_recent_transactions(
    user_id: UserId,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2"
        ))?
        .query_map((user_id.as_i64(), limit), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Delete a transaction by ID.
///
/// # Errors
/// Returns [Error::TransactionNotFound] if the transaction doesn't exist.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::TransactionNotFound);
    }

    Ok(())
}

/// Delete every transaction of a user, returning how many were deleted.
pub fn delete_all_transactions(user_id: UserId, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE user_id = ?1",
            [user_id.as_i64()],
        )
        .map_err(Error::from)
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        kind: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        chore_id: row.get(5)?,
        goal_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod transaction_type_tests {
    use std::str::FromStr;

    use crate::{Error, TransactionType};

    #[test]
    fn parses_known_types() {
        assert_eq!(
            TransactionType::from_str("chore_completed"),
            Ok(TransactionType::ChoreCompleted)
        );
        assert_eq!(
            TransactionType::from_str("goal_allocation"),
            Ok(TransactionType::GoalAllocation)
        );
    }

    #[test]
    fn rejects_unknown_type() {
        assert_eq!(
            TransactionType::from_str("refund"),
            Err(Error::InvalidTransactionType("refund".to_owned()))
        );
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&TransactionType::GoalAllocation).unwrap();

        assert_eq!(json, "\"goal_allocation\"");
    }
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    use crate::{
        Error, Money, PasswordHash, Transaction, TransactionType, User,
        db::initialize,
        user::create_user,
    };

    use super::{
        create_transaction, delete_all_transactions, delete_transaction, get_recent_transactions,
        get_transaction,
    };

    fn get_test_connection() -> (Connection, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            "kid",
            PasswordHash::new_unchecked("hunter2"),
            datetime!(2025-01-01 00:00 UTC),
            &connection,
        )
        .unwrap();

        (connection, user)
    }

    #[test]
    fn create_and_get_transaction() {
        let (connection, user) = get_test_connection();
        let builder = Transaction::build(
            TransactionType::ChoreCompleted,
            Money::new(dec!(5)),
            "Completed: Feed the dog",
        )
        .chore_id(3);

        let created = create_transaction(
            user.id,
            builder,
            datetime!(2025-01-02 09:30 UTC),
            &connection,
        )
        .unwrap();

        assert!(created.id > 0);
        assert_eq!(created.user_id, user.id);
        assert_eq!(created.kind, TransactionType::ChoreCompleted);
        assert_eq!(created.amount.to_string(), "5.00");
        assert_eq!(created.chore_id, Some(3));
        assert_eq!(created.goal_id, None);
        assert_eq!(created.created_at, datetime!(2025-01-02 09:30 UTC));
        assert_eq!(get_transaction(created.id, &connection), Ok(created));
    }

    #[test]
    fn get_missing_transaction_returns_not_found() {
        let (connection, _) = get_test_connection();

        assert_eq!(
            get_transaction(99, &connection),
            Err(Error::TransactionNotFound)
        );
    }

    #[test]
    fn recent_transactions_are_newest_first_and_limited() {
        let (connection, user) = get_test_connection();
        for day in 1..=3 {
            let created_at = datetime!(2025-01-01 00:00 UTC) + time::Duration::days(day);
            create_transaction(
                user.id,
                Transaction::build(
                    TransactionType::ChoreCompleted,
                    Money::new(day.into()),
                    &format!("Day {day}"),
                ),
                created_at,
                &connection,
            )
            .unwrap();
        }

        let transactions = get_recent_transactions(user.id, 2, &connection).unwrap();

        let descriptions: Vec<_> = transactions
            .iter()
            .map(|transaction| transaction.description.as_str())
            .collect();
        assert_eq!(descriptions, ["Day 3", "Day 2"]);
    }

    #[test]
    fn recent_transactions_only_include_user() {
        let (connection, user) = get_test_connection();
        let other_user = create_user(
            "sibling",
            PasswordHash::new_unchecked("hunter2"),
            datetime!(2025-01-01 00:00 UTC),
            &connection,
        )
        .unwrap();
        create_transaction(
            other_user.id,
            Transaction::build(TransactionType::ChoreCompleted, Money::new(dec!(1)), "x"),
            datetime!(2025-01-02 00:00 UTC),
            &connection,
        )
        .unwrap();

        let transactions = get_recent_transactions(user.id, 10, &connection).unwrap();

        assert!(transactions.is_empty());
    }

    #[test]
    fn delete_transaction_twice_fails() {
        let (connection, user) = get_test_connection();
        let transaction = create_transaction(
            user.id,
            Transaction::build(
                TransactionType::GoalAllocation,
                Money::new(dec!(-2.5)),
                "Allocated to: Bike",
            )
            .goal_id(1),
            datetime!(2025-01-02 00:00 UTC),
            &connection,
        )
        .unwrap();

        assert_eq!(delete_transaction(transaction.id, &connection), Ok(()));
        assert_eq!(
            delete_transaction(transaction.id, &connection),
            Err(Error::TransactionNotFound)
        );
    }

    #[test]
    fn delete_all_transactions_returns_count() {
        let (connection, user) = get_test_connection();
        for _ in 0..3 {
            create_transaction(
                user.id,
                Transaction::build(TransactionType::ChoreCompleted, Money::new(dec!(1)), "x"),
                datetime!(2025-01-02 00:00 UTC),
                &connection,
            )
            .unwrap();
        }

        assert_eq!(delete_all_transactions(user.id, &connection), Ok(3));
        assert_eq!(
            get_recent_transactions(user.id, 10, &connection),
            Ok(Vec::new())
        );
    }
}
