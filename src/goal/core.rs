//! Core goal types and database queries.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, DefaultUser, Error, Money, UserId,
    money::AmountInput,
    validation::{FieldError, ValidationErrors, Validator, clean_description},
};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for a goal.
pub type GoalId = i64;

/// Something the user is saving up for.
///
/// Money only enters a goal through an allocation from the user's balance and
/// only leaves it when that allocation is undone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    /// The ID of the goal.
    pub id: GoalId,
    /// The user saving for the goal.
    pub user_id: UserId,
    /// A short name, e.g. "New bike".
    pub name: String,
    /// Optional details about the goal.
    pub description: Option<String>,
    /// The amount needed to complete the goal, greater than zero.
    pub target_amount: Money,
    /// The amount allocated to the goal so far, never negative.
    pub current_amount: Money,
    /// Whether `current_amount` has reached `target_amount`.
    pub is_completed: bool,
    /// When the goal was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Goal {
    /// Set the allocated amount and recompute whether the goal is complete.
    ///
    /// Negative amounts are clamped to zero.
    pub fn with_current_amount(self, current_amount: Money) -> Self {
        let current_amount = current_amount.at_least_zero();

        Self {
            is_completed: current_amount >= self.target_amount,
            current_amount,
            ..self
        }
    }
}

/// A validated goal that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    /// A short, non-empty name.
    pub name: String,
    /// Optional details about the goal.
    pub description: Option<String>,
    /// The amount needed to complete the goal, greater than zero.
    pub target_amount: Money,
}

/// The fields to change on an existing goal. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(missing_docs)]
pub struct GoalUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub target_amount: Option<Money>,
}

/// The request body for creating or editing a goal.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct GoalForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<AmountInput>,
}

impl GoalForm {
    /// Validate the form for creating a goal. `name` and `targetAmount` are required.
    pub fn into_new_goal(self) -> Result<NewGoal, Error> {
        let mut validator = Validator::new("goal");

        let name = validator.required_name("name", self.name.as_deref());
        let target_amount =
            validator.required_amount("targetAmount", self.target_amount.as_ref());

        match (name, target_amount) {
            (Some(name), Some(target_amount)) if validator.is_valid() => Ok(NewGoal {
                name,
                description: clean_description(self.description),
                target_amount,
            }),
            _ => Err(validator.into_errors().into()),
        }
    }

    /// Validate the form for editing a goal. Missing fields are left unchanged.
    pub fn into_update(self) -> Result<GoalUpdate, Error> {
        let mut validator = Validator::new("goal");

        let name = self
            .name
            .as_deref()
            .and_then(|name| validator.name("name", name));
        let target_amount = self
            .target_amount
            .as_ref()
            .and_then(|amount| validator.amount("targetAmount", amount));

        validator.finish()?;

        Ok(GoalUpdate {
            name,
            description: self
                .description
                .map(|description| clean_description(Some(description))),
            target_amount,
        })
    }
}

/// A validated request to move money from the balance into a goal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    /// The goal to add the money to.
    pub goal_id: GoalId,
    /// How much to move, greater than zero.
    pub amount: Money,
}

/// The request body for allocating money to a goal.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct AllocationForm {
    pub goal_id: Option<GoalId>,
    pub amount: Option<AmountInput>,
}

impl AllocationForm {
    /// Validate the form. Both `goalId` and `amount` are required.
    pub fn into_allocation(self) -> Result<Allocation, Error> {
        let mut validator = Validator::new("allocation");

        if self.goal_id.is_none() {
            validator.reject("goalId", "Goal is required");
        }
        let amount = validator.required_amount("amount", self.amount.as_ref());

        match (self.goal_id, amount) {
            (Some(goal_id), Some(amount)) if validator.is_valid() => {
                Ok(Allocation { goal_id, amount })
            }
            _ => Err(validator.into_errors().into()),
        }
    }
}

/// The validation error for an allocation whose amount is not positive.
pub(crate) fn non_positive_allocation_error() -> Error {
    ValidationErrors {
        subject: "allocation",
        errors: vec![FieldError::new("amount", "Amount must be a positive number")],
    }
    .into()
}

/// The state needed by the goal endpoints.
#[derive(Debug, Clone)]
pub struct GoalState {
    /// The database connection for managing goals.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The account that requests operate on.
    pub default_user: DefaultUser,
}

impl FromRef<AppState> for GoalState {
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

const SELECT_COLUMNS: &str =
    "id, user_id, name, description, target_amount, current_amount, is_completed, created_at";

/// Create the goal table and its indexes.
pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS goal (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES user(id),
            name TEXT NOT NULL,
            description TEXT,
            target_amount TEXT NOT NULL,
            current_amount TEXT NOT NULL DEFAULT '0.00',
            is_completed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_goal_user_completed ON goal(user_id, is_completed);",
    )?;

    Ok(())
}

/// Create an empty goal for `user_id` and return it with its generated ID.
pub fn create_goal(
    user_id: UserId,
    goal: NewGoal,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Goal, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO goal
                (user_id, name, description, target_amount, current_amount, is_completed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
             RETURNING {SELECT_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                goal.name,
                goal.description,
                goal.target_amount,
                Money::zero(),
                created_at,
            ),
            map_goal_row,
        )
        .map_err(Error::from)
}

/// Retrieve a goal by ID.
///
/// # Errors
/// Returns [Error::GoalNotFound] if there is no goal with `goal_id`.
pub fn get_goal(goal_id: GoalId, connection: &Connection) -> Result<Goal, Error> {
    connection
        .prepare(&format!("SELECT {SELECT_COLUMNS} FROM goal WHERE id = :id"))?
        .query_row(&[(":id", &goal_id)], map_goal_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::GoalNotFound,
            error => error.into(),
        })
}

/// Retrieve the goals of a user that are not yet complete, newest first.
pub fn get_incomplete_goals(user_id: UserId, connection: &Connection) -> Result<Vec<Goal>, Error> {
    connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM goal
             WHERE user_id = ?1 AND is_completed = 0
             ORDER BY created_at DESC, id DESC"
        ))?
        .query_map([user_id.as_i64()], map_goal_row)?
        .map(|maybe_goal| maybe_goal.map_err(Error::from))
        .collect()
}

/// Apply `update` to one of the user's goals and return the result.
///
/// Completion is recomputed, so lowering the target can complete a goal and
/// raising it can reopen one.
///
/// # Errors
/// Returns [Error::GoalNotFound] if the goal does not exist or belongs to another user.
pub fn update_goal(
    user_id: UserId,
    goal_id: GoalId,
    update: GoalUpdate,
    connection: &Connection,
) -> Result<Goal, Error> {
    let goal = get_goal(goal_id, connection)?;

    if goal.user_id != user_id {
        return Err(Error::GoalNotFound);
    }

    let current_amount = goal.current_amount;
    let goal = Goal {
        name: update.name.unwrap_or(goal.name),
        description: update.description.unwrap_or(goal.description),
        target_amount: update.target_amount.unwrap_or(goal.target_amount),
        ..goal
    }
    .with_current_amount(current_amount);

    connection
        .prepare(&format!(
            "UPDATE goal SET name = ?1, description = ?2, target_amount = ?3, is_completed = ?4
             WHERE id = ?5
             RETURNING {SELECT_COLUMNS}"
        ))?
        .query_row(
            (
                goal.name,
                goal.description,
                goal.target_amount,
                goal.is_completed,
                goal_id,
            ),
            map_goal_row,
        )
        .map_err(Error::from)
}

/// Write the allocated amount and completion flag of `goal` to the database.
///
/// # Errors
/// Returns [Error::GoalNotFound] if the goal no longer exists.
pub fn save_goal_progress(goal: &Goal, connection: &Connection) -> Result<Goal, Error> {
    connection
        .prepare(&format!(
            "UPDATE goal SET current_amount = ?1, is_completed = ?2
             WHERE id = ?3
             RETURNING {SELECT_COLUMNS}"
        ))?
        .query_row(
            (goal.current_amount, goal.is_completed, goal.id),
            map_goal_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::GoalNotFound,
            error => error.into(),
        })
}

/// Permanently delete one of the user's goals.
///
/// Transactions that allocated money to the goal are kept.
///
/// # Errors
/// Returns [Error::GoalNotFound] if there is no goal with `goal_id` belonging to `user_id`.
pub fn delete_goal(user_id: UserId, goal_id: GoalId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM goal WHERE id = ?1 AND user_id = ?2",
        (goal_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::GoalNotFound);
    }

    Ok(())
}

/// Permanently delete every goal of a user, returning how many were deleted.
pub fn delete_all_goals(user_id: UserId, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute("DELETE FROM goal WHERE user_id = ?1", [user_id.as_i64()])
        .map_err(Error::from)
}

fn map_goal_row(row: &Row) -> Result<Goal, rusqlite::Error> {
    Ok(Goal {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        name: row.get(2)?,
        description: row.get(3)?,
        target_amount: row.get(4)?,
        current_amount: row.get(5)?,
        is_completed: row.get(6)?,
        created_at: row.get(7)?,
    })
}
