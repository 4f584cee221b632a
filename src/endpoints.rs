//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/chores/{chore_id}', tests use `format_endpoint`.

/// The route for the current user and their balance.
pub const USER: &str = "/api/user";
/// The route to list and create chores.
pub const CHORES: &str = "/api/chores";
/// The route to update or delete a single chore.
pub const CHORE: &str = "/api/chores/{chore_id}";
/// The route to claim the payment for a chore.
pub const CLAIM_CHORE: &str = "/api/chores/{chore_id}/claim";
/// The route to list and create goals.
pub const GOALS: &str = "/api/goals";
/// The route to update or delete a single goal.
pub const GOAL: &str = "/api/goals/{goal_id}";
/// The route to move money from the balance into a goal.
pub const ALLOCATE_TO_GOAL: &str = "/api/goals/allocate";
/// The route to list recent transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to undo a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to delete all chores, goals and transactions.
pub const RESET: &str = "/api/reset";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
