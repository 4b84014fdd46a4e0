//! Data layer error types

use lifeflight_analytics::AnalyticsError;
use std::path::PathBuf;
use thiserror::Error;

/// Data layer errors
#[derive(Debug, Error)]
pub enum DataError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{artifact} not found: {}", path.display())]
    NotFound {
        artifact: &'static str,
        path: PathBuf,
    },

    #[error("Required column '{field}' not found (tried: {})", candidates.join(", "))]
    MissingColumn {
        field: &'static str,
        candidates: Vec<String>,
    },

    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),
}

impl DataError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<DataError> for AnalyticsError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound { artifact, path } => Self::NotFound { artifact, path },
            other => Self::prediction(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
