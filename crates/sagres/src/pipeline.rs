//! End-to-end QMJ pipeline.
//!
//! Stages run strictly in order, each completing before the next begins:
//! link, merge, score, bucket, aggregate, evaluate.

use crate::{PanelDiagnostics, PipelineConfig, QmjReport, Reporter};
use sagres_eval::{Evaluator, PortfolioAggregator, QuintileAssigner};
use sagres_panel::{IdentifierLinker, PointInTimeMerger};
use sagres_signals::QualityScorer;
use sagres_traits::{DataSource, InputTables, Result};
use tracing::info;

/// Runs the QMJ pipeline for one configuration.
///
/// # Example
///
/// ```rust,ignore
/// use sagres::{Pipeline, PipelineConfig};
///
/// let pipeline = Pipeline::new(PipelineConfig::from_env()?);
/// let report = pipeline.run(&source)?;
/// println!("{:?}", report.evaluation.sharpe);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline with the given configuration.
    #[must_use]
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate the configuration, load the tables once and run every stage.
    ///
    /// # Errors
    ///
    /// Returns a configuration fault before touching `source`, any error the
    /// source raises, and the fatal faults of [`Pipeline::run_tables`].
    pub fn run(&self, source: &dyn DataSource) -> Result<QmjReport> {
        self.config.validate()?;
        info!(
            source = source.name(),
            start = %self.config.start_date,
            end = %self.config.end_date,
            "loading input tables"
        );
        let tables = source.load(self.config.date_range())?;
        self.run_tables(tables)
    }

    /// Run the pipeline and hand the result to `reporter`.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Pipeline::run`] or from the reporter.
    pub fn run_and_report(
        &self,
        source: &dyn DataSource,
        reporter: &mut dyn Reporter,
    ) -> Result<QmjReport> {
        let report = self.run(source)?;
        reporter.report(&report)?;
        Ok(report)
    }

    /// Run every stage on already-loaded tables.
    ///
    /// # Errors
    ///
    /// - [`sagres_traits::SagresError::Configuration`] for an invalid configuration
    /// - [`sagres_traits::SagresError::DataAvailability`] for empty or disjoint tables
    /// - [`sagres_traits::SagresError::JoinEmpty`] if linking or matching yields nothing
    /// - [`sagres_traits::SagresError::DegenerateSample`] if the only selected
    ///   metric is degenerate
    pub fn run_tables(&self, tables: InputTables) -> Result<QmjReport> {
        self.config.validate()?;
        let availability = tables.check_availability()?;
        info!(
            returns = availability.n_returns,
            fundamentals = availability.n_fundamentals,
            links = availability.n_links,
            "input tables available"
        );

        let InputTables {
            returns,
            fundamentals,
            links,
        } = tables;

        let linked = IdentifierLinker::new(&links).link(&returns)?;
        let merged =
            PointInTimeMerger::new(self.config.merger_config()).merge(linked.rows, &fundamentals)?;
        let mut scored = QualityScorer::new(self.config.scorer_config()).score(merged.rows)?;
        let quintiles = QuintileAssigner::default().assign(&mut scored.rows);

        let aggregator = PortfolioAggregator::default();
        let portfolios = aggregator.aggregate(&scored.rows);
        let spread = aggregator.spread(&portfolios);

        let evaluation =
            Evaluator::new(self.config.evaluator_config()).evaluate(&spread, self.config.metrics)?;

        let diagnostics = PanelDiagnostics {
            availability,
            link: linked.stats,
            merge: merged.stats,
            score: scored.stats,
            quintiles,
            n_portfolios: portfolios.len(),
            n_spread_months: spread.len(),
        };
        info!(
            scored = diagnostics.score.n_scored,
            portfolios = diagnostics.n_portfolios,
            spread_months = diagnostics.n_spread_months,
            "pipeline complete"
        );

        Ok(QmjReport {
            config: self.config.clone(),
            scored: scored.rows,
            portfolios,
            spread,
            evaluation,
            diagnostics,
        })
    }
}
