//! Extractors that report malformed requests with the app's error type.

use axum::extract::{FromRequest, FromRequestParts};

use crate::Error;

/// Like [axum::Json], but rejections become [Error::InvalidJson] so that they
/// are rendered as `{"message": ...}` like every other error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Like [axum::extract::Query], but rejections become [Error::InvalidQuery].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);
