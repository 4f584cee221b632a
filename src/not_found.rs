//! The response for requests to routes that do not exist.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::message::MessageResponse;

/// A fallback route handler that responds with 404 and a JSON message.
pub async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(MessageResponse::new("Not found"))).into_response()
}
