#![doc(issue_tracker_base_url = "https://github.com/factordynamics/sagres/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core record types and trait definitions for the Sagres QMJ pipeline.
//!
//! This crate provides the foundational abstractions shared by every stage:
//! the panel records, the error taxonomy, the data-access seam, the signal
//! trait and the statistics the scorer and evaluator are built on.

/// The version of the sagres-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod frame;
pub mod signal;
pub mod source;
pub mod stats;
pub mod types;

// Re-exports
pub use error::{DegenerateReason, Result, SagresError};
pub use signal::Signal;
pub use source::{AvailabilityReport, DataSource, InputTables, check_unique_security_months};
pub use types::{
    CE_TO_UNIX_EPOCH_DAYS, Date, DateRange, FirmId, FundamentalRecord, LinkInterval, LinkRecord,
    LinkedReturn, MergedObservation, Month, PortfolioReturn, ReturnObservation,
    ScoredObservation, SecurityId, SpreadObservation, month_end, months_before,
};
