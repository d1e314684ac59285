#![doc(issue_tracker_base_url = "https://github.com/factordynamics/sagres/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # sagres
//!
//! Quality Minus Junk equity factor pipeline.
//!
//! sagres scores firms by an inverse combination of leverage and return
//! volatility, sorts them into quintiles every month, and evaluates the
//! high-minus-low spread for significance and risk-adjusted performance.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sagres::{Pipeline, PipelineConfig, Result};
//!
//! # fn main() -> Result<()> {
//! let source = sagres_io::CsvDataSource::new("data/");
//! let report = Pipeline::new(PipelineConfig::from_env()?).run(&source)?;
//!
//! for q in report.quintile_summary() {
//!     println!("Q{}: {:.4}", q.quintile, q.mean_return);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Record types, errors, statistics, the [`DataSource`] seam
//! - [`panel`] - Identifier linking and lagged fundamentals matching
//! - [`signals`] - Leverage, lagged volatility and the quality composite
//! - [`eval`] - Quintiles, portfolios, spread and metrics
//!
//! ## Pipeline
//!
//! 1. **Link** each security-month to the firm active on that date
//! 2. **Merge** the latest fundamentals reported at least a year earlier
//! 3. **Score** leverage and lagged volatility, standardized over the panel
//! 4. **Bucket** each month's scores into quintiles
//! 5. **Aggregate** equal-weighted quintile returns and the 5-minus-1 spread
//! 6. **Evaluate** the spread: t-test, intercept-only regression, Sharpe

/// Version information for the sagres crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod config;
mod pipeline;
mod report;

pub use config::{END_DATE_VAR, PipelineConfig, RISK_FREE_RATE_VAR, START_DATE_VAR};
pub use pipeline::Pipeline;
pub use report::{PanelDiagnostics, QmjReport, QuintileSummary, Reporter};

// ============================================================================
// Sub-crates
// ============================================================================

/// Core record types, errors and statistics.
pub mod traits {
    pub use sagres_traits::*;
}

/// Point-in-time panel construction.
pub mod panel {
    pub use sagres_panel::*;
}

/// Quality signals.
pub mod signals {
    pub use sagres_signals::*;
}

/// Portfolio formation and evaluation.
pub mod eval {
    pub use sagres_eval::*;
}

// Re-export error and seam types at top level for convenience
pub use sagres_traits::{DataSource, DateRange, InputTables, Result, SagresError};
