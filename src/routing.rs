//! Application router configuration.

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::{
    AppState,
    chore::{
        claim_chore_endpoint, create_chore_endpoint, delete_chore_endpoint, get_chores_endpoint,
        update_chore_endpoint,
    },
    endpoints,
    goal::{
        allocate_to_goal_endpoint, create_goal_endpoint, delete_goal_endpoint, get_goals_endpoint,
        update_goal_endpoint,
    },
    not_found::get_404_not_found,
    reset::reset_endpoint,
    transaction::{get_transactions_endpoint, undo_transaction_endpoint},
    user::get_user_endpoint,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::USER, get(get_user_endpoint))
        .route(
            endpoints::CHORES,
            get(get_chores_endpoint).post(create_chore_endpoint),
        )
        .route(
            endpoints::CHORE,
            patch(update_chore_endpoint).delete(delete_chore_endpoint),
        )
        .route(endpoints::CLAIM_CHORE, post(claim_chore_endpoint))
        .route(
            endpoints::GOALS,
            get(get_goals_endpoint).post(create_goal_endpoint),
        )
        // The static allocate path takes priority over the `{goal_id}` parameter.
        .route(endpoints::ALLOCATE_TO_GOAL, post(allocate_to_goal_endpoint))
        .route(
            endpoints::GOAL,
            patch(update_goal_endpoint).delete(delete_goal_endpoint),
        )
        .route(endpoints::TRANSACTIONS, get(get_transactions_endpoint))
        .route(endpoints::TRANSACTION, delete(undo_transaction_endpoint))
        .route(endpoints::RESET, post(reset_endpoint))
        .fallback(get_404_not_found)
        .with_state(state)
}
