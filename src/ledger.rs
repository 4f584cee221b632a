//! The operations that move money between a user's balance, their goals and
//! their transaction history.
//!
//! Each operation runs inside a single SQL transaction. If any step fails the
//! SQL transaction is dropped without being committed, which rolls back every
//! write made so far. Callers must hold the connection lock for the whole
//! call so that ledger operations never interleave.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::{
    Error, Money, Transaction, TransactionId, TransactionType, UserId,
    chore::{ChoreId, delete_all_chores, get_chore},
    goal::{
        Goal, GoalId, delete_all_goals, get_goal, non_positive_allocation_error,
        save_goal_progress,
    },
    transaction::{create_transaction, delete_all_transactions, delete_transaction, get_transaction},
    user::{get_user_by_id, set_user_balance},
};

/// How long after it was recorded a transaction can still be undone.
pub const UNDO_WINDOW: Duration = Duration::hours(24);

/// The outcome of claiming a chore.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResult {
    /// The `chore_completed` transaction that was recorded.
    pub transaction: Transaction,
    /// The user's balance after the payment.
    pub new_balance: Money,
}

/// The outcome of allocating money to a goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    /// The `goal_allocation` transaction that was recorded.
    pub transaction: Transaction,
    /// The user's balance after the allocation.
    pub new_balance: Money,
    /// The goal with the allocated money added.
    pub updated_goal: Goal,
}

/// Pay the user for completing a chore.
///
/// The chore's amount is added to the user's balance and a `chore_completed`
/// transaction is recorded at `now`.
///
/// # Errors
/// Returns:
/// - [Error::ChoreNotFound] if the chore does not exist or belongs to another user,
/// - [Error::InactiveChore] if the chore has been deleted,
/// - [Error::UserNotFound] if the user does not exist,
/// - [Error::SqlError] if there is some other SQL error.
pub fn claim_chore(
    user_id: UserId,
    chore_id: ChoreId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<ClaimResult, Error> {
    let sql_transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let chore = get_chore(chore_id, &sql_transaction)?;

    if chore.user_id != user_id {
        return Err(Error::ChoreNotFound);
    }

    if !chore.is_active {
        return Err(Error::InactiveChore);
    }

    let user = get_user_by_id(user_id, &sql_transaction)?;
    let new_balance = user.total_balance + chore.amount;
    set_user_balance(user_id, new_balance, &sql_transaction)?;

    let transaction = create_transaction(
        user_id,
        Transaction::build(
            TransactionType::ChoreCompleted,
            chore.amount,
            &format!("Completed: {}", chore.name),
        )
        .chore_id(chore.id),
        now,
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    tracing::info!(
        "User {user_id} claimed {} for chore {chore_id}, balance is now {new_balance}",
        chore.amount
    );

    Ok(ClaimResult {
        transaction,
        new_balance,
    })
}

/// Move `amount` from the user's balance into one of their goals.
///
/// A `goal_allocation` transaction with the negated amount is recorded at `now`.
///
/// # Errors
/// Returns:
/// - [Error::Validation] if `amount` is not greater than zero,
/// - [Error::UserNotFound] if the user does not exist,
/// - [Error::GoalNotFound] if the goal does not exist or belongs to another user,
/// - [Error::InsufficientFunds] if `amount` is more than the user's balance,
/// - [Error::SqlError] if there is some other SQL error.
///
/// Nothing is changed when an error is returned.
pub fn allocate_to_goal(
    user_id: UserId,
    goal_id: GoalId,
    amount: Money,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<AllocationResult, Error> {
    if !amount.is_positive() {
        return Err(non_positive_allocation_error());
    }

    let sql_transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let user = get_user_by_id(user_id, &sql_transaction)?;
    let goal = get_goal(goal_id, &sql_transaction)?;

    if goal.user_id != user_id {
        return Err(Error::GoalNotFound);
    }

    if amount > user.total_balance {
        return Err(Error::InsufficientFunds);
    }

    let new_balance = user.total_balance - amount;
    set_user_balance(user_id, new_balance, &sql_transaction)?;

    let new_goal_amount = goal.current_amount + amount;
    let updated_goal =
        save_goal_progress(&goal.with_current_amount(new_goal_amount), &sql_transaction)?;

    let transaction = create_transaction(
        user_id,
        Transaction::build(
            TransactionType::GoalAllocation,
            -amount,
            &format!("Allocated to: {}", updated_goal.name),
        )
        .goal_id(goal_id),
        now,
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    tracing::info!(
        "User {user_id} allocated {amount} to goal {goal_id}, balance is now {new_balance}"
    );

    Ok(AllocationResult {
        transaction,
        new_balance,
        updated_goal,
    })
}

/// Whether `transaction` is young enough at `now` to be undone.
pub fn is_undoable(transaction: &Transaction, now: OffsetDateTime) -> bool {
    now - transaction.created_at <= UNDO_WINDOW
}

/// Reverse the effect of a transaction on the balance (and goal) and delete it.
///
/// Undoing a chore payment takes the chore amount back out of the balance.
/// Undoing an allocation returns the money to the balance and removes it from
/// the goal, which reopens the goal if it drops below its target. If the goal
/// has since been deleted, only the balance is restored.
///
/// # Errors
/// Returns:
/// - [Error::TransactionNotFound] if the transaction does not exist, e.g. it was already undone,
/// - [Error::Unauthorized] if the transaction belongs to another user,
/// - [Error::UndoExpired] if the transaction is older than [UNDO_WINDOW],
/// - [Error::UserNotFound] if the user does not exist,
/// - [Error::SqlError] if there is some other SQL error.
pub fn undo_transaction(
    user_id: UserId,
    transaction_id: TransactionId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let transaction = get_transaction(transaction_id, &sql_transaction)?;

    if transaction.user_id != user_id {
        return Err(Error::Unauthorized);
    }

    if !is_undoable(&transaction, now) {
        return Err(Error::UndoExpired);
    }

    let user = get_user_by_id(user_id, &sql_transaction)?;

    let new_balance = match transaction.kind {
        TransactionType::ChoreCompleted => user.total_balance - transaction.amount,
        TransactionType::GoalAllocation => {
            let allocated = transaction.amount.abs();

            if let Some(goal_id) = transaction.goal_id {
                take_back_from_goal(goal_id, allocated, &sql_transaction)?;
            }

            user.total_balance + allocated
        }
    };

    set_user_balance(user_id, new_balance, &sql_transaction)?;
    delete_transaction(transaction_id, &sql_transaction)?;

    sql_transaction.commit()?;

    tracing::info!(
        "User {user_id} undid transaction {transaction_id}, balance is now {new_balance}"
    );

    Ok(())
}

fn take_back_from_goal(
    goal_id: GoalId,
    amount: Money,
    connection: &Connection,
) -> Result<(), Error> {
    let goal = match get_goal(goal_id, connection) {
        Ok(goal) => goal,
        Err(Error::GoalNotFound) => {
            tracing::warn!("Goal {goal_id} no longer exists, only restoring the balance");
            return Ok(());
        }
        Err(error) => return Err(error),
    };

    let new_amount = goal.current_amount - amount;
    save_goal_progress(&goal.with_current_amount(new_amount), connection)?;

    Ok(())
}

/// Delete every transaction, chore and goal of a user and set their balance to zero.
///
/// # Errors
/// Returns [Error::UserNotFound] if the user does not exist, or
/// [Error::SqlError] if there is some other SQL error.
pub fn complete_reset(user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let sql_transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let transaction_count = delete_all_transactions(user_id, &sql_transaction)?;
    let chore_count = delete_all_chores(user_id, &sql_transaction)?;
    let goal_count = delete_all_goals(user_id, &sql_transaction)?;
    set_user_balance(user_id, Money::zero(), &sql_transaction)?;

    sql_transaction.commit()?;

    tracing::info!(
        "Reset user {user_id}: deleted {transaction_count} transactions, \
         {chore_count} chores and {goal_count} goals"
    );

    Ok(())
}
