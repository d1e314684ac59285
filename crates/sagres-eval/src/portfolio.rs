//! Equal-weighted quintile portfolios and the high-minus-low spread.

use sagres_traits::{Month, PortfolioReturn, ScoredObservation, SpreadObservation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Configuration for portfolio aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    /// Long leg bucket (default: 5)
    pub high_quintile: u8,
    /// Short leg bucket (default: 1)
    pub low_quintile: u8,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            high_quintile: 5,
            low_quintile: 1,
        }
    }
}

/// Builds the monthly portfolio table and the spread series.
#[derive(Debug, Clone, Default)]
pub struct PortfolioAggregator {
    config: PortfolioConfig,
}

impl PortfolioAggregator {
    /// Create a new aggregator with the given configuration.
    #[must_use]
    pub const fn new(config: PortfolioConfig) -> Self {
        Self { config }
    }

    /// Equal-weighted mean return per (month, quintile).
    ///
    /// Null returns are excluded from both the sum and the count. A group whose
    /// returns are all null has no defined mean and is left out. Output is
    /// ordered by month, then quintile.
    ///
    /// # Arguments
    ///
    /// * `rows` - Scored rows; rows without a bucket are ignored
    ///
    /// # Returns
    ///
    /// One [`PortfolioReturn`] per populated (month, quintile) pair
    pub fn aggregate(&self, rows: &[ScoredObservation]) -> Vec<PortfolioReturn> {
        let mut groups: BTreeMap<(Month, u8), (f64, usize)> = BTreeMap::new();
        for row in rows {
            let Some(quintile) = row.quality_quintile else {
                continue;
            };
            let entry = groups
                .entry((row.observation().month(), quintile))
                .or_insert((0.0, 0));
            if let Some(ret) = row.observation().ret.filter(|r| r.is_finite()) {
                entry.0 += ret;
                entry.1 += 1;
            }
        }

        let portfolios: Vec<PortfolioReturn> = groups
            .into_iter()
            .filter_map(|((month, quintile), (sum, n_obs))| {
                if n_obs == 0 {
                    debug!(%month, quintile, "portfolio has no non-null returns");
                    return None;
                }
                Some(PortfolioReturn {
                    month,
                    quintile,
                    mean_return: sum / n_obs as f64,
                    n_obs,
                })
            })
            .collect();

        info!(portfolios = portfolios.len(), "aggregated quintile portfolios");
        portfolios
    }

    /// High-minus-low spread per month.
    ///
    /// Months missing either leg are dropped.
    pub fn spread(&self, portfolios: &[PortfolioReturn]) -> Vec<SpreadObservation> {
        let leg = |quintile: u8| -> BTreeMap<Month, f64> {
            portfolios
                .iter()
                .filter(|p| p.quintile == quintile)
                .map(|p| (p.month, p.mean_return))
                .collect()
        };
        let high = leg(self.config.high_quintile);
        let low = leg(self.config.low_quintile);

        let spread: Vec<SpreadObservation> = high
            .iter()
            .filter_map(|(month, &high_return)| {
                let low_return = *low.get(month)?;
                Some(SpreadObservation {
                    month: *month,
                    high_return,
                    low_return,
                    spread_return: high_return - low_return,
                })
            })
            .collect();

        let unmatched = high.len() + low.len() - 2 * spread.len();
        if unmatched > 0 {
            debug!(unmatched, "months with only one spread leg dropped");
        }
        info!(months = spread.len(), "built spread series");
        spread
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sagres_traits::{Date, LinkedReturn, MergedObservation, ReturnObservation, month_end};

    fn row(month: u32, quintile: Option<u8>, ret: Option<f64>) -> ScoredObservation {
        ScoredObservation {
            row: MergedObservation {
                linked: LinkedReturn {
                    observation: ReturnObservation {
                        security_id: 1,
                        date: month_end(Date::from_ymd_opt(2021, month, 1).unwrap()),
                        ret,
                        shares_outstanding: None,
                        price: None,
                    },
                    firm_id: None,
                    link: None,
                },
                fundamental: None,
            },
            leverage: None,
            volatility_lag: None,
            leverage_z: None,
            volatility_z: None,
            quality_score: quintile.map(f64::from),
            quality_quintile: quintile,
        }
    }

    #[test]
    fn test_mean_excludes_nulls() {
        let rows = vec![
            row(3, Some(5), Some(0.02)),
            row(3, Some(5), Some(0.04)),
            row(3, Some(5), None),
        ];
        let portfolios = PortfolioAggregator::default().aggregate(&rows);
        assert_eq!(portfolios.len(), 1);
        assert_relative_eq!(portfolios[0].mean_return, 0.03, epsilon = 1e-12);
        assert_eq!(portfolios[0].n_obs, 2);
    }

    #[test]
    fn test_unbucketed_and_all_null_groups_are_skipped() {
        let rows = vec![
            row(1, None, Some(0.5)),
            row(1, Some(2), None),
            row(1, Some(1), Some(0.01)),
        ];
        let portfolios = PortfolioAggregator::default().aggregate(&rows);
        assert_eq!(portfolios.len(), 1);
        assert_eq!(portfolios[0].quintile, 1);
    }

    #[test]
    fn test_ordering() {
        let rows = vec![
            row(2, Some(5), Some(0.0)),
            row(1, Some(3), Some(0.0)),
            row(2, Some(1), Some(0.0)),
            row(1, Some(1), Some(0.0)),
        ];
        let keys: Vec<_> = PortfolioAggregator::default()
            .aggregate(&rows)
            .iter()
            .map(|p| (p.month.month(), p.quintile))
            .collect();
        assert_eq!(keys, vec![(1, 1), (1, 3), (2, 1), (2, 5)]);
    }

    #[test]
    fn test_spread_requires_both_legs() {
        let rows = vec![
            row(1, Some(5), Some(0.05)),
            row(1, Some(1), Some(0.01)),
            row(2, Some(5), Some(0.03)),
            row(3, Some(1), Some(0.02)),
        ];
        let aggregator = PortfolioAggregator::default();
        let spread = aggregator.spread(&aggregator.aggregate(&rows));
        assert_eq!(spread.len(), 1);
        assert_eq!(spread[0].month.month(), 1);
        assert_relative_eq!(spread[0].spread_return, 0.04, epsilon = 1e-12);
        assert_relative_eq!(spread[0].high_return, 0.05);
        assert_relative_eq!(spread[0].low_return, 0.01);
    }
}
