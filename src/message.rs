//! JSON bodies for plain success and error messages.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::validation::FieldError;

/// A success message, e.g. `{"message": "Chore deleted successfully"}`.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}

impl IntoResponse for MessageResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// The body of every error response.
///
/// `errors` is only present for validation errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
            errors: Vec::new(),
        }
    }
}
