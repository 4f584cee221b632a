//! Goals: the things a user is saving up for.

mod allocate_endpoint;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use allocate_endpoint::allocate_to_goal_endpoint;
pub use core::{
    AllocationForm, Goal, GoalForm, GoalId, GoalState, NewGoal,
    create_goal, create_goal_table, delete_all_goals, delete_goal, get_goal,
    get_incomplete_goals, save_goal_progress, update_goal,
};
pub use create_endpoint::create_goal_endpoint;
pub use delete_endpoint::delete_goal_endpoint;
pub use edit_endpoint::update_goal_endpoint;
pub use list_endpoint::get_goals_endpoint;

pub(crate) use core::non_positive_allocation_error;
