/// Unified error types for the catalog gateway
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum ApiError {
    /// Client sent something unusable (missing file, wrong MIME type, bad filename)
    #[error("{0}")]
    BadRequest(String),

    /// A single file exceeded the configured upload limit
    #[error("File too large. Maximum size is {max_mb}MB")]
    TooLarge { max_mb: usize },

    /// Not found errors
    #[error("{0}")]
    NotFound(String),

    /// Catalog upstream could not be reached
    #[error("Catalog upstream error: {0}")]
    Upstream(String),

    /// Decode/encode failures in the transform pipeline
    #[error("Image processing error: {0}")]
    Processing(String),

    /// Storage backend errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// A generated filename already exists in storage
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server errors, message is safe to show to clients
    #[error("{0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (startup only)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Log this error and replace it with a client-facing 500 message.
    ///
    /// Client errors (400/404) pass through untouched so their message survives.
    pub fn or_internal(self, message: &str) -> ApiError {
        match self {
            ApiError::BadRequest(_) | ApiError::TooLarge { .. } | ApiError::NotFound(_) => self,
            other => {
                tracing::error!(error = %other, "{}", message);
                ApiError::Internal(message.to_string())
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::TooLarge { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error envelope returned by every JSON endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
}

/// Convert ApiError to HTTP response
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            ApiError::BadRequest(_)
            | ApiError::TooLarge { .. }
            | ApiError::NotFound(_)
            | ApiError::Internal(_) => self.to_string(),
            ApiError::Upstream(_) => "Failed to reach catalog upstream".to_string(),
            ApiError::Processing(_) => "Failed to process image".to_string(),
            // Don't leak details
            _ => "Something went wrong".to_string(),
        };

        crate::metrics::record_error(self.kind());

        let body = Json(ErrorEnvelope {
            success: false,
            error: message,
        });

        (status, body).into_response()
    }
}

impl ApiError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::TooLarge { .. } => "too_large",
            ApiError::NotFound(_) => "not_found",
            ApiError::Upstream(_) => "upstream",
            ApiError::Processing(_) => "processing",
            ApiError::Storage(_) => "storage",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal",
            ApiError::Io(_) => "io",
            ApiError::Config(_) => "config",
        }
    }
}

/// Result type alias for gateway operations
pub type ApiResult<T> = Result<T, ApiError>;
