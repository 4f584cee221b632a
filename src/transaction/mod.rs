//! Transactions: the history of money moving in and out of a user's balance.
//!
//! Transactions are only ever created by the [ledger](crate::ledger) and only
//! removed by undoing them or by a complete reset.

mod core;
mod list_endpoint;
mod undo_endpoint;

pub use core::{
    Transaction, TransactionId, TransactionType, create_transaction,
    create_transaction_table, delete_all_transactions, delete_transaction,
    get_recent_transactions, get_transaction,
};
pub use list_endpoint::get_transactions_endpoint;
pub use undo_endpoint::undo_transaction_endpoint;
