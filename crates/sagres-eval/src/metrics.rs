//! Risk-adjusted performance of the spread series.

use sagres_traits::{
    DegenerateReason, Result, SagresError,
    stats::{MIN_STD_THRESHOLD, moments},
};
use serde::{Deserialize, Serialize};

/// Configuration for Sharpe ratio calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SharpeConfig {
    /// Per-period risk-free rate subtracted from each return (default: 0.0)
    pub risk_free_rate: f64,
    /// Periods per year for annualization (default: 12)
    pub periods_per_year: u32,
}

impl Default for SharpeConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            periods_per_year: 12,
        }
    }
}

/// Sharpe ratio: mean excess return over its standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SharpeRatio {
    /// Mean excess return per period
    pub mean_excess: f64,
    /// Sample standard deviation of excess returns
    pub std_excess: f64,
    /// Per-period Sharpe ratio
    pub monthly: f64,
    /// Annualized Sharpe ratio
    pub annualized: f64,
    /// Risk-free rate used
    pub risk_free_rate: f64,
    /// Number of observations
    pub n_obs: usize,
}

impl SharpeRatio {
    /// Metric name used in errors and reports.
    pub const METRIC: &'static str = "sharpe";

    /// Calculate the Sharpe ratio of a return series.
    ///
    /// # Arguments
    ///
    /// * `returns` - Per-period returns; non-finite values are dropped
    /// * `config` - Risk-free rate and annualization
    ///
    /// # Returns
    ///
    /// The per-period and annualized ratios, where
    /// `annualized = monthly * sqrt(periods_per_year)`
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::DegenerateSample`] with fewer than two returns or
    /// zero standard deviation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sagres_eval::{SharpeConfig, SharpeRatio};
    ///
    /// let sharpe = SharpeRatio::calculate(&[0.01, 0.03, -0.01], &SharpeConfig::default()).unwrap();
    /// assert!((sharpe.annualized - sharpe.monthly * 12f64.sqrt()).abs() < 1e-12);
    /// ```
    pub fn calculate(returns: &[f64], config: &SharpeConfig) -> Result<Self> {
        let excess: Vec<f64> = returns
            .iter()
            .filter(|r| r.is_finite())
            .map(|r| r - config.risk_free_rate)
            .collect();
        let m = moments(&excess);

        if m.n_obs < 2 {
            return Err(SagresError::degenerate(
                Self::METRIC,
                DegenerateReason::InsufficientSample { n_obs: m.n_obs },
            ));
        }
        if m.std <= MIN_STD_THRESHOLD {
            return Err(SagresError::degenerate(
                Self::METRIC,
                DegenerateReason::ZeroVariance,
            ));
        }

        let monthly = m.mean / m.std;
        Ok(Self {
            mean_excess: m.mean,
            std_excess: m.std,
            monthly,
            annualized: monthly * f64::from(config.periods_per_year).sqrt(),
            risk_free_rate: config.risk_free_rate,
            n_obs: m.n_obs,
        })
    }
}
