//! Run configuration.

use chrono::NaiveDate;
use sagres_eval::{EvaluatorConfig, MetricSelection, SharpeConfig};
use sagres_panel::MergerConfig;
use sagres_signals::{ScorerConfig, TrailingVolatilityConfig};
use sagres_traits::{Date, DateRange, Result, SagresError};
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable holding the first date of the run.
pub const START_DATE_VAR: &str = "SAGRES_START_DATE";
/// Environment variable holding the last date of the run.
pub const END_DATE_VAR: &str = "SAGRES_END_DATE";
/// Environment variable holding the per-period risk-free rate.
pub const RISK_FREE_RATE_VAR: &str = "SAGRES_RISK_FREE_RATE";

/// Parameters of one pipeline run.
///
/// # Example
///
/// ```
/// use sagres::PipelineConfig;
/// use chrono::NaiveDate;
///
/// let config = PipelineConfig {
///     start_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// First calendar date of the return sample (inclusive)
    pub start_date: Date,
    /// Last calendar date of the return sample (inclusive)
    pub end_date: Date,
    /// Per-period risk-free rate subtracted before the Sharpe ratio (default: 0.0)
    pub risk_free_rate: f64,
    /// Months a fundamentals report must age before use (default: 12)
    pub fundamental_lag_months: u32,
    /// Rolling volatility window in months (default: 12)
    pub volatility_window: usize,
    /// Minimum non-null returns in the volatility window (default: 6)
    pub volatility_min_periods: usize,
    /// Months the volatility series is shifted forward (default: 1)
    pub volatility_lag: usize,
    /// Periods per year for annualization (default: 12)
    pub periods_per_year: u32,
    /// Metrics to compute on the spread
    pub metrics: MetricSelection,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or(NaiveDate::MIN),
            end_date: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap_or(NaiveDate::MAX),
            risk_free_rate: 0.0,
            fundamental_lag_months: 12,
            volatility_window: 12,
            volatility_min_periods: 6,
            volatility_lag: 1,
            periods_per_year: 12,
            metrics: MetricSelection::all(),
        }
    }
}

impl PipelineConfig {
    /// Default configuration over the given range.
    #[must_use]
    pub fn with_range(start_date: Date, end_date: Date) -> Self {
        Self {
            start_date,
            end_date,
            ..Self::default()
        }
    }

    /// Load the date range and risk-free rate from the environment.
    ///
    /// A `.env` file in the working directory is read first if present.
    /// `SAGRES_START_DATE` and `SAGRES_END_DATE` are required (`YYYY-MM-DD`);
    /// `SAGRES_RISK_FREE_RATE` is optional.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::Configuration`] if `.env` is malformed, a date
    /// is missing or malformed, or the risk-free rate does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(None, None)
    }

    /// Like [`PipelineConfig::from_env`], but dates given here take
    /// precedence and their variables are not read.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::Configuration`] if `.env` is malformed, a date
    /// that must come from the environment is missing or malformed, or the
    /// risk-free rate does not parse.
    pub fn from_env_with(start_date: Option<Date>, end_date: Option<Date>) -> Result<Self> {
        check_dotenv(dotenvy::dotenv())?;

        let start_date = match start_date {
            Some(date) => date,
            None => required_date(START_DATE_VAR)?,
        };
        let end_date = match end_date {
            Some(date) => date,
            None => required_date(END_DATE_VAR)?,
        };
        let risk_free_rate = match env::var(RISK_FREE_RATE_VAR) {
            Ok(raw) => raw.trim().parse::<f64>().map_err(|e| {
                SagresError::Configuration(format!("{RISK_FREE_RATE_VAR}={raw:?}: {e}"))
            })?,
            Err(_) => 0.0,
        };

        Ok(Self {
            start_date,
            end_date,
            risk_free_rate,
            ..Self::default()
        })
    }

    /// Check the configuration before any data is touched.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::Configuration`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let fault = |msg: String| Err(SagresError::Configuration(msg));

        if self.start_date > self.end_date {
            return fault(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return fault(format!("risk-free rate {} is not finite", self.risk_free_rate));
        }
        if self.fundamental_lag_months < 12 {
            return fault(format!(
                "fundamental lag of {} months is shorter than one year",
                self.fundamental_lag_months
            ));
        }
        if self.volatility_min_periods < 2 {
            return fault(format!(
                "volatility min periods {} must be at least 2",
                self.volatility_min_periods
            ));
        }
        if self.volatility_window < self.volatility_min_periods {
            return fault(format!(
                "volatility window {} is shorter than min periods {}",
                self.volatility_window, self.volatility_min_periods
            ));
        }
        if self.periods_per_year == 0 {
            return fault("periods per year must be positive".to_string());
        }
        if self.metrics.is_empty() {
            return fault("no evaluation metric selected".to_string());
        }
        Ok(())
    }

    /// The run's date range.
    #[must_use]
    pub const fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Merger settings derived from this configuration.
    #[must_use]
    pub const fn merger_config(&self) -> MergerConfig {
        MergerConfig {
            lag_months: self.fundamental_lag_months,
        }
    }

    /// Scorer settings derived from this configuration.
    #[must_use]
    pub fn scorer_config(&self) -> ScorerConfig {
        ScorerConfig {
            volatility: TrailingVolatilityConfig {
                window: self.volatility_window,
                min_periods: self.volatility_min_periods,
                lag: self.volatility_lag,
            },
            ..ScorerConfig::default()
        }
    }

    /// Evaluator settings derived from this configuration.
    #[must_use]
    pub const fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            sharpe: SharpeConfig {
                risk_free_rate: self.risk_free_rate,
                periods_per_year: self.periods_per_year,
            },
        }
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is a fault.
fn check_dotenv<T>(loaded: dotenvy::Result<T>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(SagresError::Configuration(format!(".env: {e}"))),
    }
}

fn required_date(var: &str) -> Result<Date> {
    let raw = env::var(var)
        .map_err(|_| SagresError::Configuration(format!("{var} is not set")))?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| SagresError::Configuration(format!("{var}={raw:?}: {e}")))
}
