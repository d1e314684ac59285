//! Point-in-time panel construction for the Sagres QMJ pipeline.
//!
//! This crate turns the raw input tables into the merged monthly panel:
//!
//! - [`IdentifierLinker`] attributes each security-month to the firm whose
//!   link interval is active on that date.
//! - [`PointInTimeMerger`] attaches the most recent fundamentals reported at
//!   least a year before the return date.
//!
//! Both stages are built on the grouped backward as-of primitives in
//! [`asof`] and run their per-group work through [`map_groups`], which uses
//! rayon when the `parallel` feature is enabled.
//!
//! # Examples
//!
//! ```rust,no_run
//! use sagres_panel::{IdentifierLinker, PointInTimeMerger};
//! # fn run(tables: sagres_traits::InputTables) -> sagres_traits::Result<()> {
//! let linked = IdentifierLinker::new(&tables.links).link(&tables.returns)?;
//! let merged = PointInTimeMerger::default().merge(linked.rows, &tables.fundamentals)?;
//! println!("{} rows with fundamentals", merged.stats.n_with_fundamentals);
//! # Ok(())
//! # }
//! ```

pub mod asof;
mod link;
mod merge;
mod parallel;

// Re-export main types
pub use link::{IdentifierLinker, LinkEntry, LinkOutcome, LinkStats};
pub use merge::{MergeOutcome, MergeStats, MergerConfig, PointInTimeMerger};
pub use parallel::{group_indices, map_groups, map_groups_aligned, map_slice};
