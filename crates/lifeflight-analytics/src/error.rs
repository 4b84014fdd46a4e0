//! Analytics error types.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed cause carried by computation failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Analytics errors.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Invalid parameter supplied by the caller
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A required artifact (model, data file, population table) is missing
    #[error("{artifact} not found: {}", path.display())]
    NotFound {
        artifact: &'static str,
        path: PathBuf,
    },

    /// The model or a numerical step failed while producing results
    #[error("Prediction failed: {0}")]
    PredictionFailed(#[source] BoxError),
}

/// Coarse failure category, for callers that map errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    BadInput,
    NotFound,
    Computation,
}

impl AnalyticsError {
    /// Wrap any failure raised while a model is predicting.
    pub fn prediction<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::PredictionFailed(err.into())
    }

    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidParameter(_) => ErrorCategory::BadInput,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::PredictionFailed(_) => ErrorCategory::Computation,
        }
    }
}

impl From<lifeflight_domain::DomainError> for AnalyticsError {
    fn from(err: lifeflight_domain::DomainError) -> Self {
        Self::InvalidParameter(err.to_string())
    }
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_are_distinct() {
        let bad = AnalyticsError::InvalidParameter("years".into());
        let missing = AnalyticsError::NotFound {
            artifact: "Model file",
            path: PathBuf::from("model/model_prophet.json"),
        };
        let failed = AnalyticsError::prediction("unexpected shape");

        assert_eq!(bad.category(), ErrorCategory::BadInput);
        assert_eq!(missing.category(), ErrorCategory::NotFound);
        assert_eq!(failed.category(), ErrorCategory::Computation);
        assert_eq!(
            missing.to_string(),
            "Model file not found: model/model_prophet.json"
        );
        assert_eq!(failed.to_string(), "Prediction failed: unexpected shape");
    }
}
