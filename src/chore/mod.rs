//! Chores: the paid tasks a user can claim money for.

mod claim_endpoint;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use claim_endpoint::claim_chore_endpoint;
pub use core::{
    Chore, ChoreForm, ChoreIcon, ChoreId, ChoreState, NewChore, create_chore,
    create_chore_table, deactivate_chore, delete_all_chores, get_active_chores, get_chore,
    update_chore,
};
pub use create_endpoint::create_chore_endpoint;
pub use delete_endpoint::delete_chore_endpoint;
pub use edit_endpoint::update_chore_endpoint;
pub use list_endpoint::get_chores_endpoint;
