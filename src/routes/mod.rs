pub mod auth;
pub mod movies;
pub mod users;

use crate::error::ApiError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use tracing::warn;

// Extractor rejections become `InvalidInput` so every client error shares the
// `{"message": ..}` body.

pub(crate) fn bad_json(rejection: JsonRejection) -> ApiError {
    warn!("Rejecting request body: {}", rejection.body_text());
    ApiError::InvalidInput("Invalid request body".to_string())
}

pub(crate) fn bad_path(rejection: PathRejection) -> ApiError {
    warn!("Rejecting path: {}", rejection.body_text());
    ApiError::InvalidInput("Invalid movie id".to_string())
}

pub(crate) fn bad_query(rejection: QueryRejection) -> ApiError {
    warn!("Rejecting query: {}", rejection.body_text());
    ApiError::InvalidInput("Invalid query parameters".to_string())
}
