//! Defines the endpoint for deleting a goal.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use crate::{
    db::lock_connection,
    goal::{GoalId, GoalState, delete_goal},
    message::MessageResponse,
    user::get_or_create_user,
};

/// A route handler for deleting a goal, responds with a message.
///
/// Money allocated to the goal is not returned to the balance.
pub async fn delete_goal_endpoint(
    Path(goal_id): Path<GoalId>,
    State(state): State<GoalState>,
) -> Response {
    let result = lock_connection(&state.db_connection).and_then(|connection| {
        let user = get_or_create_user(&state.default_user, OffsetDateTime::now_utc(), &connection)?;
        delete_goal(user.id, goal_id, &connection)
    });

    match result {
        Ok(()) => {
            tracing::info!("Deleted goal {goal_id}");
            MessageResponse::new("Goal deleted successfully").into_response()
        }
        Err(error) => error.into_json_response("Failed to delete goal"),
    }
}
