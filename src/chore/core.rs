//! Core chore types and database queries.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, DefaultUser, Error, Money, UserId,
    money::AmountInput,
    validation::{Validator, clean_description},
};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for a chore.
pub type ChoreId = i64;

/// The picture shown next to a chore.
///
/// Icons are display-only. Unknown values read from the database fall back to
/// [ChoreIcon::Broom].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ChoreIcon {
    #[default]
    Broom,
    Car,
    Dog,
    Utensils,
    Music,
    Laundry,
    Plants,
    Study,
    House,
    Babysit,
    Coffee,
    Vacuum,
}

impl ChoreIcon {
    /// Every icon, in the order they are offered to users.
    pub const ALL: [ChoreIcon; 12] = [
        ChoreIcon::Broom,
        ChoreIcon::Car,
        ChoreIcon::Dog,
        ChoreIcon::Utensils,
        ChoreIcon::Music,
        ChoreIcon::Laundry,
        ChoreIcon::Plants,
        ChoreIcon::Study,
        ChoreIcon::House,
        ChoreIcon::Babysit,
        ChoreIcon::Coffee,
        ChoreIcon::Vacuum,
    ];

    /// The tag stored in the database and sent to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChoreIcon::Broom => "broom",
            ChoreIcon::Car => "car",
            ChoreIcon::Dog => "dog",
            ChoreIcon::Utensils => "utensils",
            ChoreIcon::Music => "music",
            ChoreIcon::Laundry => "laundry",
            ChoreIcon::Plants => "plants",
            ChoreIcon::Study => "study",
            ChoreIcon::House => "house",
            ChoreIcon::Babysit => "babysit",
            ChoreIcon::Coffee => "coffee",
            ChoreIcon::Vacuum => "vacuum",
        }
    }

    /// Find the icon with the tag `name`.
    pub fn parse(name: &str) -> Option<Self> {
        ChoreIcon::ALL
            .into_iter()
            .find(|icon| icon.as_str() == name.trim())
    }
}

impl Display for ChoreIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for ChoreIcon {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ChoreIcon {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(ChoreIcon::parse(value.as_str()?).unwrap_or_default())
    }
}

/// A task the user is paid for completing.
///
/// Chores are never removed from the database while their user exists:
/// deleting a chore clears `is_active` so past transactions can still refer to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chore {
    /// The ID of the chore.
    pub id: ChoreId,
    /// The user who gets paid for the chore.
    pub user_id: UserId,
    /// A short name, e.g. "Feed the dog".
    pub name: String,
    /// Optional details about what needs doing.
    pub description: Option<String>,
    /// The payment for completing the chore.
    pub amount: Money,
    /// The picture shown next to the chore.
    pub icon: ChoreIcon,
    /// False once the chore has been deleted.
    pub is_active: bool,
    /// When the chore was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A validated chore that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChore {
    /// A short, non-empty name.
    pub name: String,
    /// Optional details about what needs doing.
    pub description: Option<String>,
    /// The payment for completing the chore, greater than zero.
    pub amount: Money,
    /// The picture shown next to the chore.
    pub icon: ChoreIcon,
}

/// The fields to change on an existing chore. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(missing_docs)]
pub struct ChoreUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub amount: Option<Money>,
    pub icon: Option<ChoreIcon>,
}

/// The request body for creating or editing a chore.
///
/// Every field is optional here so that missing fields are reported as
/// validation errors rather than JSON errors.
#[derive(Debug, Default, Deserialize)]
#[allow(missing_docs)]
pub struct ChoreForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<AmountInput>,
    pub icon: Option<String>,
}

impl ChoreForm {
    /// Validate the form for creating a chore. `name` and `amount` are required.
    pub fn into_new_chore(self) -> Result<NewChore, Error> {
        let mut validator = Validator::new("chore");

        let name = validator.required_name("name", self.name.as_deref());
        let amount = validator.required_amount("amount", self.amount.as_ref());
        let icon = validate_icon(&mut validator, self.icon.as_deref());

        match (name, amount) {
            (Some(name), Some(amount)) if validator.is_valid() => Ok(NewChore {
                name,
                description: clean_description(self.description),
                amount,
                icon: icon.unwrap_or_default(),
            }),
            _ => Err(validator.into_errors().into()),
        }
    }

    /// Validate the form for editing a chore. Missing fields are left unchanged.
    pub fn into_update(self) -> Result<ChoreUpdate, Error> {
        let mut validator = Validator::new("chore");

        let name = self
            .name
            .as_deref()
            .and_then(|name| validator.name("name", name));
        let amount = self
            .amount
            .as_ref()
            .and_then(|amount| validator.amount("amount", amount));
        let icon = validate_icon(&mut validator, self.icon.as_deref());

        validator.finish()?;

        Ok(ChoreUpdate {
            name,
            description: self
                .description
                .map(|description| clean_description(Some(description))),
            amount,
            icon,
        })
    }
}

fn validate_icon(validator: &mut Validator, icon: Option<&str>) -> Option<ChoreIcon> {
    let icon = icon?;

    let parsed = ChoreIcon::parse(icon);
    if parsed.is_none() {
        validator.reject("icon", &format!("Unknown icon \"{icon}\""));
    }

    parsed
}

/// The state needed by the chore endpoints.
#[derive(Debug, Clone)]
pub struct ChoreState {
    /// The database connection for managing chores.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The account that requests operate on.
    pub default_user: DefaultUser,
}

impl FromRef<AppState> for ChoreState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            default_user: state.default_user.clone(),
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_COLUMNS: &str = "id, user_id, name, description, amount, icon, is_active, created_at";

/// Create the chore table and its indexes.
pub fn create_chore_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS chore (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES user(id),
            name TEXT NOT NULL,
            description TEXT,
            amount TEXT NOT NULL,
            icon TEXT NOT NULL DEFAULT 'broom',
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chore_user_active ON chore(user_id, is_active);",
    )?;

    Ok(())
}

/// Create an active chore for `user_id` and return it with its generated ID.
pub fn create_chore(
    user_id: UserId,
    chore: NewChore,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Chore, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO chore (user_id, name, description, amount, icon, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
             RETURNING {SELECT_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                chore.name,
                chore.description,
                chore.amount,
                chore.icon,
                created_at,
            ),
            map_chore_row,
        )
        .map_err(Error::from)
}

/// Retrieve a chore by ID, whether or not it is active.
///
/// # Errors
/// Returns [Error::ChoreNotFound] if there is no chore with `chore_id`.
pub fn get_chore(chore_id: ChoreId, connection: &Connection) -> Result<Chore, Error> {
    connection
        .prepare(&format!("SELECT {SELECT_COLUMNS} FROM chore WHERE id = :id"))?
        .query_row(&[(":id", &chore_id)], map_chore_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::ChoreNotFound,
            error => error.into(),
        })
}

/// Retrieve the active chores of a user, newest first.
pub fn get_active_chores(user_id: UserId, connection: &Connection) -> Result<Vec<Chore>, Error> {
    connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM chore
             WHERE user_id = ?1 AND is_active = 1
             ORDER BY created_at DESC, id DESC"
        ))?
        .query_map([user_id.as_i64()], map_chore_row)?
        .map(|maybe_chore| maybe_chore.map_err(Error::from))
        .collect()
}

/// Apply `update` to one of the user's active chores and return the result.
///
/// # Errors
/// Returns [Error::ChoreNotFound] if the chore does not exist, belongs to
/// another user, or has been deleted.
pub fn update_chore(
    user_id: UserId,
    chore_id: ChoreId,
    update: ChoreUpdate,
    connection: &Connection,
) -> Result<Chore, Error> {
    let chore = get_chore(chore_id, connection)?;

    if chore.user_id != user_id || !chore.is_active {
        return Err(Error::ChoreNotFound);
    }

    connection
        .prepare(&format!(
            "UPDATE chore SET name = ?1, description = ?2, amount = ?3, icon = ?4
             WHERE id = ?5
             RETURNING {SELECT_COLUMNS}"
        ))?
        .query_row(
            (
                update.name.unwrap_or(chore.name),
                update.description.unwrap_or(chore.description),
                update.amount.unwrap_or(chore.amount),
                update.icon.unwrap_or(chore.icon),
                chore_id,
            ),
            map_chore_row,
        )
        .map_err(Error::from)
}

/// Mark one of the user's chores as inactive.
///
/// # Errors
/// Returns [Error::ChoreNotFound] if there is no active chore with `chore_id`
/// belonging to `user_id`.
pub fn deactivate_chore(
    user_id: UserId,
    chore_id: ChoreId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE chore SET is_active = 0 WHERE id = ?1 AND user_id = ?2 AND is_active = 1",
        (chore_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::ChoreNotFound);
    }

    Ok(())
}

/// Permanently delete every chore of a user, returning how many were deleted.
pub fn delete_all_chores(user_id: UserId, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute("DELETE FROM chore WHERE user_id = ?1", [user_id.as_i64()])
        .map_err(Error::from)
}

fn map_chore_row(row: &Row) -> Result<Chore, rusqlite::Error> {
    Ok(Chore {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        name: row.get(2)?,
        description: row.get(3)?,
        amount: row.get(4)?,
        icon: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
    })
}


#[cfg(test)]
mod chore_query_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::{Duration, macros::datetime};

    use crate::{
        Error, Money, PasswordHash, User,
        chore::{
            ChoreIcon, core::ChoreUpdate, NewChore, create_chore, deactivate_chore, delete_all_chores,
            get_active_chores, get_chore, update_chore,
        },
        db::initialize,
        user::create_user,
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

    fn new_chore(name: &str) -> NewChore {
        NewChore {
            name: name.to_owned(),
            description: None,
            amount: Money::new(dec!(2)),
            icon: ChoreIcon::Broom,
        }
    }

    #[test]
    fn create_chore_succeeds() {
        let (connection, user) = get_test_connection();

        let chore = create_chore(
            user.id,
            new_chore("Sweep"),
            datetime!(2025-01-02 00:00 UTC),
            &connection,
        )
        .expect("Could not create chore");

        assert!(chore.id > 0);
        assert_eq!(chore.user_id, user.id);
        assert_eq!(chore.name, "Sweep");
        assert!(chore.is_active);
        assert_eq!(get_chore(chore.id, &connection), Ok(chore));
    }

    #[test]
    fn get_missing_chore_returns_not_found() {
        let (connection, _) = get_test_connection();

        assert_eq!(get_chore(1, &connection), Err(Error::ChoreNotFound));
    }

    #[test]
    fn active_chores_are_newest_first() {
        let (connection, user) = get_test_connection();
        let start = datetime!(2025-01-02 00:00 UTC);
        for (i, name) in ["First", "Second", "Third"].into_iter().enumerate() {
            create_chore(
                user.id,
                new_chore(name),
                start + Duration::minutes(i as i64),
                &connection,
            )
            .unwrap();
        }

        let chores = get_active_chores(user.id, &connection).unwrap();

        let names: Vec<_> = chores.iter().map(|chore| chore.name.as_str()).collect();
        assert_eq!(names, ["Third", "Second", "First"]);
    }

    #[test]
    fn deactivated_chores_are_hidden_but_kept() {
        let (connection, user) = get_test_connection();
        let chore = create_chore(
            user.id,
            new_chore("Sweep"),
            datetime!(2025-01-02 00:00 UTC),
            &connection,
        )
        .unwrap();

        deactivate_chore(user.id, chore.id, &connection).unwrap();

        assert_eq!(get_active_chores(user.id, &connection), Ok(Vec::new()));
        let stored = get_chore(chore.id, &connection).unwrap();
        assert!(!stored.is_active);
    }

    #[test]
    fn deactivating_twice_fails() {
        let (connection, user) = get_test_connection();
        let chore = create_chore(
            user.id,
            new_chore("Sweep"),
            datetime!(2025-01-02 00:00 UTC),
            &connection,
        )
        .unwrap();
        deactivate_chore(user.id, chore.id, &connection).unwrap();

        assert_eq!(
            deactivate_chore(user.id, chore.id, &connection),
            Err(Error::ChoreNotFound)
        );
    }

    #[test]
    fn update_changes_only_given_fields() {
        let (connection, user) = get_test_connection();
        let chore = create_chore(
            user.id,
            NewChore {
                description: Some("Kitchen and hall".to_owned()),
                ..new_chore("Sweep")
            },
            datetime!(2025-01-02 00:00 UTC),
            &connection,
        )
        .unwrap();

        let updated = update_chore(
            user.id,
            chore.id,
            ChoreUpdate {
                amount: Some(Money::new(dec!(4.25))),
                icon: Some(ChoreIcon::Vacuum),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.name, "Sweep");
        assert_eq!(updated.description.as_deref(), Some("Kitchen and hall"));
        assert_eq!(updated.amount.to_string(), "4.25");
        assert_eq!(updated.icon, ChoreIcon::Vacuum);
    }

    #[test]
    fn update_can_clear_description() {
        let (connection, user) = get_test_connection();
        let chore = create_chore(
            user.id,
            NewChore {
                description: Some("Kitchen".to_owned()),
                ..new_chore("Sweep")
            },
            datetime!(2025-01-02 00:00 UTC),
            &connection,
        )
        .unwrap();

        let updated = update_chore(
            user.id,
            chore.id,
            ChoreUpdate {
                description: Some(None),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.description, None);
    }

    #[test]
    fn update_inactive_chore_fails() {
        let (connection, user) = get_test_connection();
        let chore = create_chore(
            user.id,
            new_chore("Sweep"),
            datetime!(2025-01-02 00:00 UTC),
            &connection,
        )
        .unwrap();
        deactivate_chore(user.id, chore.id, &connection).unwrap();

        let result = update_chore(user.id, chore.id, ChoreUpdate::default(), &connection);

        assert_eq!(result, Err(Error::ChoreNotFound));
    }

    #[test]
    fn unknown_icon_in_database_reads_as_broom() {
        let (connection, user) = get_test_connection();
        let chore = create_chore(
            user.id,
            new_chore("Sweep"),
            datetime!(2025-01-02 00:00 UTC),
            &connection,
        )
        .unwrap();
        connection
            .execute("UPDATE chore SET icon = 'rocket' WHERE id = ?1", [chore.id])
            .unwrap();

        assert_eq!(
            get_chore(chore.id, &connection).unwrap().icon,
            ChoreIcon::Broom
        );
    }

    #[test]
    fn delete_all_removes_inactive_chores_too() {
        let (connection, user) = get_test_connection();
        let now = datetime!(2025-01-02 00:00 UTC);
        let chore = create_chore(user.id, new_chore("Sweep"), now, &connection).unwrap();
        create_chore(user.id, new_chore("Dust"), now, &connection).unwrap();
        deactivate_chore(user.id, chore.id, &connection).unwrap();

        assert_eq!(delete_all_chores(user.id, &connection), Ok(2));
        assert_eq!(get_chore(chore.id, &connection), Err(Error::ChoreNotFound));
    }
}
