//! Signal implementations for the Sagres QMJ factor.
//!
//! Quality is scored from two characteristics, both "lower is better":
//! - Leverage: total debt over total assets, from lagged fundamentals
//! - Volatility: trailing 12-month return volatility, lagged one month
//!
//! [`QualityScorer`] standardizes each over the whole panel and combines the
//! z-scores into an inverted equal-weight composite.
//!
//! # Example
//!
//! ```ignore
//! use sagres_signals::{QualityScorer, ScorerConfig};
//!
//! let scorer = QualityScorer::new(ScorerConfig::default());
//! let scored = scorer.score(merged_rows)?;
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod quality;

// Re-export key types
pub use quality::{
    CompositeConfig, InvertedEqualWeight, Leverage, QualityScorer, ScoreOutcome, ScoreStats,
    ScorerConfig, SignalScore, TrailingVolatility, TrailingVolatilityConfig,
};
