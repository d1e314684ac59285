//! A [`Reporter`] writing run output to a directory.

use crate::IoError;
use polars::prelude::*;
use sagres::{PanelDiagnostics, PipelineConfig, QmjReport, QuintileSummary, Reporter};
use sagres_eval::EvaluationReport;
use sagres_traits::frame::{portfolios_to_frame, scored_to_frame, spread_to_frame};
use sagres_traits::Result as SagresResult;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Scored per-security-month table.
pub const SCORED_FILE: &str = "scored.csv";

/// Monthly quintile portfolio returns.
pub const PORTFOLIOS_FILE: &str = "portfolios.csv";

/// High-minus-low spread series.
pub const SPREAD_FILE: &str = "spread.csv";

/// Metrics, diagnostics and configuration.
pub const METRICS_FILE: &str = "metrics.json";

#[derive(Serialize)]
struct MetricsDocument<'a> {
    version: &'static str,
    config: &'a PipelineConfig,
    evaluation: &'a EvaluationReport,
    quintiles: Vec<QuintileSummary>,
    diagnostics: &'a PanelDiagnostics,
}

/// Writes the three tables as CSV and the metrics as pretty JSON.
///
/// The output directory is created on first use. Existing files are
/// overwritten.
#[derive(Debug, Clone)]
pub struct FileReporter {
    out_dir: PathBuf,
}

impl FileReporter {
    /// Create a reporter writing into `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Directory the files are written to.
    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn write_csv(&self, file: &str, mut df: DataFrame) -> crate::Result<()> {
        let path = self.out_dir.join(file);
        let mut handle = File::create(&path)?;
        CsvWriter::new(&mut handle)
            .include_header(true)
            .finish(&mut df)?;
        Ok(())
    }

    fn write_all(&self, report: &QmjReport) -> crate::Result<()> {
        fs::create_dir_all(&self.out_dir)?;

        self.write_csv(SCORED_FILE, scored_to_frame(&report.scored)?)?;
        self.write_csv(PORTFOLIOS_FILE, portfolios_to_frame(&report.portfolios)?)?;
        self.write_csv(SPREAD_FILE, spread_to_frame(&report.spread)?)?;

        let document = MetricsDocument {
            version: sagres::VERSION,
            config: &report.config,
            evaluation: &report.evaluation,
            quintiles: report.quintile_summary(),
            diagnostics: &report.diagnostics,
        };
        let file = File::create(self.out_dir.join(METRICS_FILE))?;
        serde_json::to_writer_pretty(file, &document)?;

        info!(
            out_dir = %self.out_dir.display(),
            scored = report.scored.len(),
            portfolios = report.portfolios.len(),
            spread = report.spread.len(),
            "wrote report"
        );
        Ok(())
    }
}

impl Reporter for FileReporter {
    fn report(&mut self, report: &QmjReport) -> SagresResult<()> {
        self.write_all(report).map_err(IoError::into_report)
    }
}
