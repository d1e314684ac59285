//! Upstream filtering conventions applied by the data collaborator.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Keep rows whose `column` holds one of `allowed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    /// Column to test
    pub column: String,
    /// Accepted values
    pub allowed: Vec<String>,
}

impl ColumnFilter {
    /// Create a filter accepting any of `allowed`.
    pub fn new(column: &str, allowed: &[&str]) -> Self {
        Self {
            column: column.to_string(),
            allowed: allowed.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Apply to `df`. A frame without the column is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns a polars error if the column cannot be cast to strings.
    pub fn apply(&self, df: DataFrame) -> PolarsResult<DataFrame> {
        if !df.get_column_names().iter().any(|c| c.as_str() == self.column) {
            debug!(column = %self.column, "filter column absent, skipped");
            return Ok(df);
        }

        let values = df
            .column(&self.column)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let mask = values
            .str()?
            .into_iter()
            .map(|v: Option<&str>| v.is_some_and(|s| self.allowed.iter().any(|a| a == s.trim())))
            .collect::<BooleanChunked>();

        let before = df.height();
        let filtered = df.filter(&mask)?;
        debug!(
            column = %self.column,
            kept = filtered.height(),
            dropped = before - filtered.height(),
            "applied column filter"
        );
        Ok(filtered)
    }
}

/// Row filters the data source applies before handing tables to the pipeline.
///
/// Defaults follow the usual research conventions: industrial-format,
/// standardized, consolidated, domestic fundamentals with positive total
/// assets, and primary research-quality links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFilters {
    /// Filters on the fundamentals table
    pub fundamentals: Vec<ColumnFilter>,
    /// Filters on the links table
    pub links: Vec<ColumnFilter>,
    /// Drop fundamentals whose total assets are missing or not positive
    pub require_positive_assets: bool,
}

impl Default for SourceFilters {
    fn default() -> Self {
        Self {
            fundamentals: vec![
                ColumnFilter::new("indfmt", &["INDL"]),
                ColumnFilter::new("datafmt", &["STD"]),
                ColumnFilter::new("consol", &["C"]),
                ColumnFilter::new("popsrc", &["D"]),
            ],
            links: vec![
                ColumnFilter::new("linktype", &["LU", "LC"]),
                ColumnFilter::new("linkprim", &["P", "C"]),
            ],
            require_positive_assets: true,
        }
    }
}

impl SourceFilters {
    /// No filtering at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            fundamentals: Vec::new(),
            links: Vec::new(),
            require_positive_assets: false,
        }
    }

    /// Apply the fundamentals column filters.
    ///
    /// # Errors
    ///
    /// Returns a polars error if a filter column cannot be read.
    pub fn apply_fundamentals(&self, df: DataFrame) -> PolarsResult<DataFrame> {
        self.fundamentals.iter().try_fold(df, |df, f| f.apply(df))
    }

    /// Apply the links column filters.
    ///
    /// # Errors
    ///
    /// Returns a polars error if a filter column cannot be read.
    pub fn apply_links(&self, df: DataFrame) -> PolarsResult<DataFrame> {
        self.links.iter().try_fold(df, |df, f| f.apply(df))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_filter() {
        let df = df! {
            "firm_id" => ["A", "B", "C"],
            "linktype" => ["LU", "NU", "LC "],
        }
        .unwrap();
        let filtered = ColumnFilter::new("linktype", &["LU", "LC"]).apply(df).unwrap();
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn test_absent_column_is_skipped() {
        let df = df! { "firm_id" => ["A", "B"] }.unwrap();
        let filtered = SourceFilters::default().apply_fundamentals(df).unwrap();
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn test_default_conventions() {
        let filters = SourceFilters::default();
        assert_eq!(filters.fundamentals.len(), 4);
        assert_eq!(filters.links[1].allowed, vec!["P", "C"]);
        assert!(filters.require_positive_assets);
        assert!(SourceFilters::none().links.is_empty());
    }
}
