#![doc(issue_tracker_base_url = "https://github.com/factordynamics/sagres/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # sagres-io
//!
//! File-backed collaborators for the sagres pipeline: a [`CsvDataSource`]
//! that loads the returns, fundamentals and links tables with the usual
//! research filters, and a [`FileReporter`] that writes the scored panel,
//! portfolio and spread tables plus a metrics document.

mod csv_source;
mod error;
mod filters;
mod reporter;

pub use csv_source::{CsvDataSource, FUNDAMENTALS_FILE, LINKS_FILE, RETURNS_FILE};
pub use error::{IoError, Result};
pub use filters::{ColumnFilter, SourceFilters};
pub use reporter::{FileReporter, METRICS_FILE, PORTFOLIOS_FILE, SCORED_FILE, SPREAD_FILE};
