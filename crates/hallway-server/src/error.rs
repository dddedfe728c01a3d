use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hallway_store::StoreError;
use thiserror::Error;

/// Errors surfaced by API handlers, mapped onto the JSON failure envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::InvalidInput(_) | ApiError::InvalidState(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Internal(_) => {
                // Detail goes to the log, not to the caller.
                tracing::error!(error = %self, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "success": false,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::NotFound("Record not found".to_string()),
            StoreError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::InvalidState(msg) => ApiError::InvalidState(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
