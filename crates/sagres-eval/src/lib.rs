//! Quintile portfolios and spread evaluation for Sagres.
//!
//! This crate covers the back half of the pipeline:
//! - Monthly quintile assignment with explicit degenerate-month handling
//! - Equal-weighted (month, quintile) portfolio returns and the 5-minus-1 spread
//! - One-sample t-test and intercept-only regression of the spread mean
//! - Monthly and annualized Sharpe ratios
//!
//! # Example
//!
//! ```rust,ignore
//! use sagres_eval::{Evaluator, MetricSelection, PortfolioAggregator, QuintileAssigner};
//!
//! QuintileAssigner::default().assign(&mut scored);
//! let aggregator = PortfolioAggregator::default();
//! let portfolios = aggregator.aggregate(&scored);
//! let spread = aggregator.spread(&portfolios);
//! let report = Evaluator::default().evaluate(&spread, MetricSelection::all())?;
//! ```

pub mod evaluator;
pub mod metrics;
pub mod portfolio;
pub mod quintile;
pub mod regression;
pub mod significance;

// Re-export main types
pub use evaluator::{EvaluationReport, Evaluator, EvaluatorConfig, MetricOutcome, MetricSelection};
pub use metrics::{SharpeConfig, SharpeRatio};
pub use portfolio::{PortfolioAggregator, PortfolioConfig};
pub use quintile::{MonthBucketing, QuintileAssigner, QuintileConfig, QuintileStats};
pub use regression::RegressionResult;
pub use significance::TTestResult;
