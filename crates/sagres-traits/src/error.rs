//! Error types for the Sagres pipeline.
//!
//! Faults that make the whole downstream panel meaningless (bad configuration,
//! missing or disjoint inputs, empty merges) abort a run. Degenerate samples are
//! local to a single metric and are usually reported as undefined rather than
//! propagated; see `sagres_eval::MetricOutcome`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a statistic could not be computed on a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum DegenerateReason {
    /// Fewer than two valid observations.
    InsufficientSample {
        /// Number of valid observations that were available.
        n_obs: usize,
    },
    /// All valid observations are identical.
    ZeroVariance,
}

impl fmt::Display for DegenerateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientSample { n_obs } => {
                write!(f, "insufficient sample ({n_obs} valid observations, need 2)")
            }
            Self::ZeroVariance => write!(f, "zero variance"),
        }
    }
}

/// The main error type for Sagres operations.
#[derive(Debug, Error)]
pub enum SagresError {
    /// Missing or invalid run parameters. Raised before any data access.
    #[error("Configuration fault: {0}")]
    Configuration(String),

    /// An input table is empty, or two tables share no keys.
    #[error("Data availability fault: {0}")]
    DataAvailability(String),

    /// An as-of merge produced no rows for any group.
    #[error("Join produced no rows: {0}")]
    JoinEmpty(String),

    /// A statistic was requested on a degenerate sample.
    #[error("Degenerate sample for {metric}: {reason}")]
    DegenerateSample {
        /// Name of the metric being computed.
        metric: String,
        /// What made the sample degenerate.
        reason: DegenerateReason,
    },

    /// Error when a required column is missing from an input frame.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error raised by the data-access collaborator.
    #[error("Data fetch error: {0}")]
    DataFetch(String),

    /// Error raised by the reporting collaborator.
    #[error("Report error: {0}")]
    Report(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl SagresError {
    /// Build a [`SagresError::DegenerateSample`] for the named metric.
    pub fn degenerate(metric: impl Into<String>, reason: DegenerateReason) -> Self {
        Self::DegenerateSample {
            metric: metric.into(),
            reason,
        }
    }

    /// Whether this fault aborts the whole run.
    ///
    /// Only degenerate samples are recoverable; everything else leaves the
    /// downstream panel meaningless.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::DegenerateSample { .. })
    }
}

/// A specialized Result type for Sagres operations.
pub type Result<T> = std::result::Result<T, SagresError>;
