use crate::session::SessionError;
use crate::users::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// Every failure a handler can report. The body is always `{"message": ..}`;
/// causes are logged, never sent to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Provider call failed. The message is the caller-facing summary.
    #[error("{message}")]
    Upstream {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("Server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn upstream(message: &'static str) -> impl FnOnce(anyhow::Error) -> ApiError {
        move |source| ApiError::Upstream { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Upstream { .. } | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound => ApiError::NotFound(err.to_string()),
            StoreError::InvalidRating(_) => ApiError::InvalidInput(err.to_string()),
            StoreError::EmailTaken => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        warn!("Rejected session: {}", err);
        ApiError::Unauthorized("Authentication required")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Upstream { message, source } => error!("{}: {:#}", message, source),
            ApiError::Internal(source) => error!("Internal error: {:#}", source),
            _ => {}
        }
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}
