//! Run output and the reporting seam.

use crate::PipelineConfig;
use sagres_eval::{EvaluationReport, QuintileStats};
use sagres_panel::{LinkStats, MergeStats};
use sagres_signals::ScoreStats;
use sagres_traits::{
    AvailabilityReport, PortfolioReturn, Result, ScoredObservation, SpreadObservation,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Row counts and statistics of every stage of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelDiagnostics {
    /// Input table sizes and key overlaps
    pub availability: AvailabilityReport,
    /// Identifier linking
    pub link: LinkStats,
    /// Lagged fundamentals matching
    pub merge: MergeStats,
    /// Quality scoring
    pub score: ScoreStats,
    /// Monthly bucketing
    pub quintiles: QuintileStats,
    /// Populated (month, quintile) portfolios
    pub n_portfolios: usize,
    /// Months in the spread series
    pub n_spread_months: usize,
}

/// Time-series average of one quintile's monthly returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuintileSummary {
    /// Quintile bucket
    pub quintile: u8,
    /// Mean of the monthly portfolio returns
    pub mean_return: f64,
    /// Months the quintile was populated
    pub n_months: usize,
}

/// Everything a run produces, as plain structured records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QmjReport {
    /// Configuration the run used
    pub config: PipelineConfig,
    /// Merged per-security-month scored table
    pub scored: Vec<ScoredObservation>,
    /// Monthly (month, quintile) portfolio returns
    pub portfolios: Vec<PortfolioReturn>,
    /// High-minus-low spread series
    pub spread: Vec<SpreadObservation>,
    /// Significance test, regression and Sharpe ratios
    pub evaluation: EvaluationReport,
    /// Per-stage diagnostics
    pub diagnostics: PanelDiagnostics,
}

impl QmjReport {
    /// Average monthly return of each quintile across the sample.
    pub fn quintile_summary(&self) -> Vec<QuintileSummary> {
        let mut sums: BTreeMap<u8, (f64, usize)> = BTreeMap::new();
        for p in &self.portfolios {
            let entry = sums.entry(p.quintile).or_insert((0.0, 0));
            entry.0 += p.mean_return;
            entry.1 += 1;
        }
        sums.into_iter()
            .map(|(quintile, (sum, n_months))| QuintileSummary {
                quintile,
                mean_return: sum / n_months as f64,
                n_months,
            })
            .collect()
    }
}

/// Receives the output of a run.
///
/// Implementations decide where the tables and metrics go (files, a database,
/// a dashboard); the pipeline itself never prints.
pub trait Reporter {
    /// Deliver a finished report.
    ///
    /// # Errors
    ///
    /// Returns [`sagres_traits::SagresError::Report`] if the report cannot be
    /// written.
    fn report(&mut self, report: &QmjReport) -> Result<()>;
}
