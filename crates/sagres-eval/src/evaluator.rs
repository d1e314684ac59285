//! Spread evaluation: significance, regression and Sharpe ratio.
//!
//! Each selected metric degrades on its own. A degenerate sample makes that
//! metric [`MetricOutcome::Undefined`] with a reason code, unless it is the
//! only metric requested, in which case the error is returned.

use crate::{
    metrics::{SharpeConfig, SharpeRatio},
    regression::RegressionResult,
    significance::TTestResult,
};
use sagres_traits::{DegenerateReason, Result, SagresError, SpreadObservation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A metric value, or the reason it could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricOutcome<T> {
    /// The metric was computed
    Computed(T),
    /// The sample was degenerate
    Undefined {
        /// Why the metric is undefined
        reason: DegenerateReason,
    },
}

impl<T> MetricOutcome<T> {
    /// The computed value, if any.
    pub const fn computed(&self) -> Option<&T> {
        match self {
            Self::Computed(value) => Some(value),
            Self::Undefined { .. } => None,
        }
    }

    /// Whether the metric was computed.
    pub const fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }
}

/// Which metrics to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSelection {
    /// One-sample t-test of the spread mean
    pub t_test: bool,
    /// Intercept-only regression
    pub regression: bool,
    /// Sharpe ratios
    pub sharpe: bool,
}

impl Default for MetricSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl MetricSelection {
    /// Every metric.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            t_test: true,
            regression: true,
            sharpe: true,
        }
    }

    /// Number of selected metrics.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.t_test as usize + self.regression as usize + self.sharpe as usize
    }

    /// Whether nothing is selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Configuration for the evaluator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Sharpe ratio settings
    pub sharpe: SharpeConfig,
}

/// The three metric bundles for one spread series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Months in the spread series
    pub n_months: usize,
    /// Significance test, if selected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_test: Option<MetricOutcome<TTestResult>>,
    /// Intercept-only regression, if selected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regression: Option<MetricOutcome<RegressionResult>>,
    /// Sharpe ratios, if selected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpe: Option<MetricOutcome<SharpeRatio>>,
}

/// Evaluates a spread series.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvaluatorConfig,
}

impl Evaluator {
    /// Create a new evaluator with the given configuration.
    #[must_use]
    pub const fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Compute the selected metrics on the spread returns.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::Configuration`] if nothing is selected, and
    /// [`SagresError::DegenerateSample`] if the single selected metric is
    /// degenerate.
    pub fn evaluate(
        &self,
        spread: &[SpreadObservation],
        selection: MetricSelection,
    ) -> Result<EvaluationReport> {
        if selection.is_empty() {
            return Err(SagresError::Configuration(
                "no evaluation metric selected".to_string(),
            ));
        }

        let returns: Vec<f64> = spread.iter().map(|s| s.spread_return).collect();
        let sole = selection.count() == 1;

        let t_test = selection
            .t_test
            .then(|| outcome(TTestResult::calculate(&returns), sole))
            .transpose()?;
        let regression = selection
            .regression
            .then(|| outcome(RegressionResult::fit(&returns), sole))
            .transpose()?;
        let sharpe = selection
            .sharpe
            .then(|| outcome(SharpeRatio::calculate(&returns, &self.config.sharpe), sole))
            .transpose()?;

        info!(months = returns.len(), "evaluated spread series");

        Ok(EvaluationReport {
            n_months: returns.len(),
            t_test,
            regression,
            sharpe,
        })
    }
}

fn outcome<T>(result: Result<T>, sole: bool) -> Result<MetricOutcome<T>> {
    match result {
        Ok(value) => Ok(MetricOutcome::Computed(value)),
        Err(SagresError::DegenerateSample { metric, reason }) if !sole => {
            warn!(%metric, %reason, "metric undefined");
            Ok(MetricOutcome::Undefined { reason })
        }
        Err(e) => Err(e),
    }
}
