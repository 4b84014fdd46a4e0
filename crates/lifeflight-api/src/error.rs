//! # API Error Types
//!
//! Unified error handling for the REST API layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lifeflight_analytics::{AnalyticsError, ErrorCategory};
use lifeflight_data::DataError;
use thiserror::Error;

/// API-level errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<lifeflight_domain::DomainError> for ApiError {
    fn from(err: lifeflight_domain::DomainError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl ApiError {
    /// Get HTTP status code for this error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Analytics(err) => match err.category() {
                ErrorCategory::BadInput => StatusCode::BAD_REQUEST,
                ErrorCategory::NotFound => StatusCode::NOT_FOUND,
                ErrorCategory::Computation => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Data(DataError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Data(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Analytics(err) => match err.category() {
                ErrorCategory::BadInput => "INVALID_INPUT",
                ErrorCategory::NotFound => "NOT_FOUND",
                ErrorCategory::Computation => "PREDICTION_FAILED",
            },
            Self::Data(DataError::NotFound { .. }) => "NOT_FOUND",
            Self::Data(_) => "DATA_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "Request failed");
        } else {
            tracing::debug!(error = %self, code = self.error_code(), "Request rejected");
        }

        let body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "code": self.error_code(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
