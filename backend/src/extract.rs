//! Request extractors

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON request body whose rejections use the API error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
