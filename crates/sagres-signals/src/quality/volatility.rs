//! Trailing return volatility signal.

use sagres_panel::map_groups_aligned;
use sagres_traits::{MergedObservation, Result, SagresError, Signal, stats::rolling_std};
use serde::{Deserialize, Serialize};

/// Configuration for the trailing volatility signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailingVolatilityConfig {
    /// Rolling window length in monthly observations (default: 12)
    pub window: usize,

    /// Minimum non-null returns inside the window (default: 6)
    pub min_periods: usize,

    /// Observations to shift the result forward by (default: 1)
    pub lag: usize,
}

impl Default for TrailingVolatilityConfig {
    fn default() -> Self {
        Self {
            window: 12,
            min_periods: 6,
            lag: 1,
        }
    }
}

/// Rolling sample standard deviation of a security's own monthly returns,
/// shifted so that the value at month t only uses returns through t - lag.
///
/// Computed per security over every row of that security in the panel,
/// including rows without a firm link.
#[derive(Debug, Clone, Default)]
pub struct TrailingVolatility {
    config: TrailingVolatilityConfig,
}

impl TrailingVolatility {
    /// Create a new volatility signal with the given configuration.
    #[must_use]
    pub const fn new(config: TrailingVolatilityConfig) -> Self {
        Self { config }
    }

    /// Get the rolling window length.
    #[must_use]
    pub const fn window(&self) -> usize {
        self.config.window
    }

    /// Get the minimum number of observations.
    #[must_use]
    pub const fn min_periods(&self) -> usize {
        self.config.min_periods
    }

    /// Get the lag.
    #[must_use]
    pub const fn lag(&self) -> usize {
        self.config.lag
    }
}

impl Signal for TrailingVolatility {
    fn name(&self) -> &str {
        "volatility_lag"
    }

    fn compute(&self, panel: &[MergedObservation]) -> Result<Vec<Option<f64>>> {
        let TrailingVolatilityConfig {
            window,
            min_periods,
            lag,
        } = self.config;
        if min_periods < 2 || window < min_periods {
            return Err(SagresError::Configuration(format!(
                "volatility window {window} must hold at least min_periods {min_periods} >= 2"
            )));
        }

        Ok(map_groups_aligned(
            panel,
            |row| row.observation().security_id,
            |_, positions| {
                let mut order: Vec<usize> = (0..positions.len()).collect();
                order.sort_by_key(|&slot| panel[positions[slot]].observation().date);

                let returns: Vec<Option<f64>> = order
                    .iter()
                    .map(|&slot| panel[positions[slot]].observation().ret)
                    .collect();
                let rolling = rolling_std(&returns, window, min_periods);

                let mut out = vec![None; positions.len()];
                for (k, &slot) in order.iter().enumerate() {
                    out[slot] = k.checked_sub(lag).and_then(|j| rolling[j]);
                }
                out
            },
        ))
    }

    fn lookback(&self) -> usize {
        self.config.window + self.config.lag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sagres_traits::{Date, LinkedReturn, ReturnObservation, SecurityId, month_end, stats};

    fn row(security_id: SecurityId, month: u32, ret: Option<f64>) -> MergedObservation {
        MergedObservation {
            linked: LinkedReturn {
                observation: ReturnObservation {
                    security_id,
                    date: month_end(Date::from_ymd_opt(2020, month, 1).unwrap()),
                    ret,
                    shares_outstanding: None,
                    price: None,
                },
                firm_id: None,
                link: None,
            },
            fundamental: None,
        }
    }

    #[test]
    fn test_default_config() {
        let signal = TrailingVolatility::default();
        assert_eq!(signal.window(), 12);
        assert_eq!(signal.min_periods(), 6);
        assert_eq!(signal.lag(), 1);
        assert_eq!(signal.lookback(), 13);
        assert_eq!(signal.name(), "volatility_lag");
    }

    #[test]
    fn test_min_periods_and_lag() {
        let returns = [0.01, -0.02, 0.03, 0.00, 0.02, -0.01, 0.04, 0.01];
        let panel: Vec<_> = returns
            .iter()
            .enumerate()
            .map(|(i, r)| row(1, i as u32 + 1, Some(*r)))
            .collect();

        let values = TrailingVolatility::default().compute(&panel).unwrap();

        // Six returns are first available at month 6, usable from month 7.
        assert!(values[..6].iter().all(Option::is_none));
        assert_relative_eq!(values[6].unwrap(), stats::moments(&returns[..6]).std, epsilon = 1e-12);
        assert_relative_eq!(values[7].unwrap(), stats::moments(&returns[..7]).std, epsilon = 1e-12);
    }

    #[test]
    fn test_null_returns_do_not_count() {
        let mut panel: Vec<_> = (1..=8).map(|m| row(1, m, Some(0.01 * f64::from(m)))).collect();
        panel[2].linked.observation.ret = None;

        let values = TrailingVolatility::default().compute(&panel).unwrap();
        // Month 7 sees months 1..=6 with one null: only five returns.
        assert_eq!(values[6], None);
        assert!(values[7].is_some());
    }

    #[test]
    fn test_securities_do_not_mix_and_order_is_restored() {
        // Interleaved and reversed input.
        let mut panel = Vec::new();
        for m in (1..=9).rev() {
            panel.push(row(1, m, Some(0.01 * f64::from(m))));
            panel.push(row(2, m, Some(0.05)));
        }
        let values = TrailingVolatility::default().compute(&panel).unwrap();

        for (row, value) in panel.iter().zip(&values) {
            let month = row.observation().date.format("%m").to_string();
            match (row.observation().security_id, month.as_str()) {
                (1, "08") => {
                    let expected = stats::moments(&[0.01, 0.02, 0.03, 0.04, 0.05, 0.06, 0.07]).std;
                    assert_relative_eq!(value.unwrap(), expected, epsilon = 1e-12);
                }
                (2, "08" | "09") => assert_relative_eq!(value.unwrap(), 0.0, epsilon = 1e-12),
                (_, "01" | "02" | "03" | "04" | "05" | "06") => assert_eq!(*value, None),
                _ => {}
            }
        }
    }

    #[test]
    fn test_invalid_window_is_configuration_error() {
        let signal = TrailingVolatility::new(TrailingVolatilityConfig {
            window: 4,
            min_periods: 6,
            lag: 1,
        });
        assert!(matches!(
            signal.compute(&[]),
            Err(SagresError::Configuration(_))
        ));
    }
}
