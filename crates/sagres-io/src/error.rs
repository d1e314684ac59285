//! Error types for file-backed collaborators.

use sagres_traits::SagresError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading inputs or writing reports.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An expected input file is absent.
    #[error("Missing input file: {}", .0.display())]
    MissingFile(PathBuf),

    /// Polars failed to read or write a frame.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A table was read but its contents are invalid.
    #[error(transparent)]
    Pipeline(#[from] SagresError),
}

impl IoError {
    /// Map into the pipeline taxonomy as a data fetch failure.
    ///
    /// Content errors from table conversion pass through unchanged.
    pub fn into_fetch(self) -> SagresError {
        match self {
            Self::Pipeline(e) => e,
            other => SagresError::DataFetch(other.to_string()),
        }
    }

    /// Map into the pipeline taxonomy as a reporting failure.
    pub fn into_report(self) -> SagresError {
        match self {
            Self::Pipeline(e) => e,
            other => SagresError::Report(other.to_string()),
        }
    }
}

/// A specialized Result type for file operations.
pub type Result<T> = std::result::Result<T, IoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping() {
        let missing = IoError::MissingFile(PathBuf::from("/data/returns.csv"));
        assert!(matches!(missing.into_fetch(), SagresError::DataFetch(msg) if msg.contains("returns.csv")));

        let content = IoError::from(SagresError::MissingColumn("date".to_string()));
        assert!(matches!(content.into_fetch(), SagresError::MissingColumn(_)));

        let io = IoError::from(std::io::Error::other("disk full"));
        assert!(matches!(io.into_report(), SagresError::Report(msg) if msg.contains("disk full")));
    }
}
