//! Quality signals based on balance-sheet strength and return stability.
//!
//! This module provides the two raw characteristics and the scorer that
//! turns them into a single quality score per security-month:
//! - Leverage: (long-term debt + current debt) / total assets
//! - Trailing volatility: rolling sample std of monthly returns, lagged
//!
//! Low leverage and low volatility produce high scores.

mod composite;
mod leverage;
mod scorer;
mod volatility;

pub use composite::{CompositeConfig, InvertedEqualWeight, SignalScore};
pub use leverage::Leverage;
pub use scorer::{QualityScorer, ScoreOutcome, ScoreStats, ScorerConfig};
pub use volatility::{TrailingVolatility, TrailingVolatilityConfig};
