//! A [`DataSource`] reading the three input tables from CSV files.

use crate::{IoError, SourceFilters};
use polars::prelude::*;
use sagres_traits::frame::{fundamentals_from_frame, links_from_frame, returns_from_frame};
use sagres_traits::{DataSource, DateRange, InputTables, Result as SagresResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File holding monthly security returns.
pub const RETURNS_FILE: &str = "returns.csv";

/// File holding firm fundamentals.
pub const FUNDAMENTALS_FILE: &str = "fundamentals.csv";

/// File holding security-to-firm links.
pub const LINKS_FILE: &str = "links.csv";

/// Loads `returns.csv`, `fundamentals.csv` and `links.csv` from a directory.
///
/// Every column is read as text and converted by the frame helpers, so dates
/// may be written as `YYYY-MM-DD` or `YYYYMMDD` and empty fields are nulls.
///
/// # Example
///
/// ```no_run
/// use sagres_io::{CsvDataSource, SourceFilters};
///
/// let source = CsvDataSource::new("data/").with_filters(SourceFilters::none());
/// ```
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    dir: PathBuf,
    filters: SourceFilters,
    name: String,
}

impl CsvDataSource {
    /// Create a source over `dir` with the default filters.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = format!("csv:{}", dir.display());
        Self {
            dir,
            filters: SourceFilters::default(),
            name,
        }
    }

    /// Replace the row filters.
    #[must_use]
    pub fn with_filters(mut self, filters: SourceFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Directory the tables are read from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Active row filters.
    #[must_use]
    pub const fn filters(&self) -> &SourceFilters {
        &self.filters
    }

    fn read_table(&self, file: &str) -> crate::Result<DataFrame> {
        let path = self.dir.join(file);
        if !path.is_file() {
            return Err(IoError::MissingFile(path));
        }

        let df = LazyCsvReader::new(&path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        debug!(path = %path.display(), rows = df.height(), "read table");
        Ok(df)
    }

    fn load_tables(&self, range: DateRange) -> crate::Result<InputTables> {
        let returns = returns_from_frame(&self.read_table(RETURNS_FILE)?)?;
        let n_returns = returns.len();
        let returns: Vec<_> = returns
            .into_iter()
            .filter(|r| range.contains(r.date))
            .collect();

        let fundamentals_df = self
            .filters
            .apply_fundamentals(self.read_table(FUNDAMENTALS_FILE)?)?;
        let n_fundamentals = fundamentals_df.height();
        let fundamentals: Vec<_> = fundamentals_from_frame(&fundamentals_df)?
            .into_iter()
            .filter(|f| f.report_date <= range.end)
            .filter(|f| {
                !self.filters.require_positive_assets || f.total_assets.is_some_and(|a| a > 0.0)
            })
            .collect();

        let links_df = self.filters.apply_links(self.read_table(LINKS_FILE)?)?;
        let n_links = links_df.height();
        let links: Vec<_> = links_from_frame(&links_df)?
            .into_iter()
            .filter(|l| range.overlaps(l.link_start, l.link_end))
            .collect();

        info!(
            source = %self.name,
            returns = returns.len(),
            returns_dropped = n_returns - returns.len(),
            fundamentals = fundamentals.len(),
            fundamentals_dropped = n_fundamentals - fundamentals.len(),
            links = links.len(),
            links_dropped = n_links - links.len(),
            "loaded input tables"
        );

        Ok(InputTables::new(returns, fundamentals, links))
    }
}

impl DataSource for CsvDataSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self, range: DateRange) -> SagresResult<InputTables> {
        self.load_tables(range).map_err(IoError::into_fetch)
    }
}
