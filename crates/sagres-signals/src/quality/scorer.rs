//! Quality scorer: raw signals to a composite score per row.

use super::{
    composite::{CompositeConfig, InvertedEqualWeight, SignalScore},
    leverage::Leverage,
    volatility::{TrailingVolatility, TrailingVolatilityConfig},
};
use sagres_traits::{
    MergedObservation, Result, ScoredObservation, Signal,
    stats::{StandardizeResult, standardize},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configuration for the quality scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Trailing volatility settings
    pub volatility: TrailingVolatilityConfig,
    /// Composite settings
    pub composite: CompositeConfig,
}

/// Counts and standardization statistics of one scoring pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    /// Rows scored
    pub n_rows: usize,
    /// Rows with a defined leverage
    pub n_with_leverage: usize,
    /// Rows with a defined lagged volatility
    pub n_with_volatility: usize,
    /// Rows with a non-null quality score
    pub n_scored: usize,
    /// Panel-wide leverage statistics
    pub leverage: StandardizeResult,
    /// Panel-wide lagged volatility statistics
    pub volatility: StandardizeResult,
}

/// Output of [`QualityScorer::score`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    /// One row per input row, in input order, quintile not yet assigned
    pub rows: Vec<ScoredObservation>,
    /// Pass statistics
    pub stats: ScoreStats,
}

/// Computes leverage and lagged volatility, standardizes both over the whole
/// panel, and combines them into `-0.5 * leverage_z - 0.5 * volatility_z`.
///
/// Standardization uses the mean and standard deviation of every non-null
/// value in the panel, across all months at once.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: ScorerConfig,
}

impl QualityScorer {
    /// Create a new scorer with the given configuration.
    #[must_use]
    pub const fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Score every row of the merged panel.
    ///
    /// # Errors
    ///
    /// Returns an error if the volatility configuration is invalid.
    pub fn score(&self, panel: Vec<MergedObservation>) -> Result<ScoreOutcome> {
        let leverage_signal = Leverage;
        let volatility_signal = TrailingVolatility::new(self.config.volatility);

        let leverage = leverage_signal.compute(&panel)?;
        let volatility = volatility_signal.compute(&panel)?;

        let (leverage_z, leverage_stats) = standardize(&leverage);
        let (volatility_z, volatility_stats) = standardize(&volatility);
        for (name, result) in [
            (leverage_signal.name(), &leverage_stats),
            (volatility_signal.name(), &volatility_stats),
        ] {
            if !result.applied {
                warn!(
                    signal = name,
                    n_obs = result.n_obs,
                    std = result.std,
                    "degenerate panel distribution, z-scores set to zero"
                );
            }
        }

        let composite = InvertedEqualWeight::new(self.config.composite).combine(&[
            SignalScore {
                name: leverage_signal.name().to_string(),
                scores: leverage_z.clone(),
            },
            SignalScore {
                name: volatility_signal.name().to_string(),
                scores: volatility_z.clone(),
            },
        ])?;

        let rows: Vec<ScoredObservation> = panel
            .into_iter()
            .zip(leverage)
            .zip(volatility)
            .zip(leverage_z)
            .zip(volatility_z)
            .zip(composite)
            .map(
                |(((((row, leverage), volatility_lag), leverage_z), volatility_z), quality_score)| {
                    ScoredObservation {
                        row,
                        leverage,
                        volatility_lag,
                        leverage_z,
                        volatility_z,
                        quality_score,
                        quality_quintile: None,
                    }
                },
            )
            .collect();

        let stats = ScoreStats {
            n_rows: rows.len(),
            n_with_leverage: leverage_stats.n_obs,
            n_with_volatility: volatility_stats.n_obs,
            n_scored: rows.iter().filter(|r| r.quality_score.is_some()).count(),
            leverage: leverage_stats,
            volatility: volatility_stats,
        };

        if stats.n_scored == 0 {
            warn!(rows = stats.n_rows, "no row has both leverage and volatility");
        }
        info!(
            rows = stats.n_rows,
            with_leverage = stats.n_with_leverage,
            with_volatility = stats.n_with_volatility,
            scored = stats.n_scored,
            "computed quality scores"
        );

        Ok(ScoreOutcome { rows, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sagres_traits::{
        Date, FundamentalRecord, LinkInterval, LinkedReturn, ReturnObservation, SecurityId,
        month_end,
    };

    fn fundamental(firm: &str, debt: f64) -> FundamentalRecord {
        FundamentalRecord {
            firm_id: firm.to_string(),
            report_date: Date::from_ymd_opt(2018, 12, 31).unwrap(),
            total_assets: Some(100.0),
            long_term_debt: Some(debt),
            current_debt: Some(0.0),
            revenue: None,
            cost_of_goods_sold: None,
            sga: None,
            return_on_assets: None,
        }
    }

    fn row(security_id: SecurityId, month: u32, ret: f64, debt: Option<f64>) -> MergedObservation {
        let firm = format!("F{security_id}");
        MergedObservation {
            linked: LinkedReturn {
                observation: ReturnObservation {
                    security_id,
                    date: month_end(Date::from_ymd_opt(2020, month, 1).unwrap()),
                    ret: Some(ret),
                    shares_outstanding: None,
                    price: None,
                },
                firm_id: Some(firm.clone()),
                link: Some(LinkInterval {
                    start: Date::from_ymd_opt(2000, 1, 1).unwrap(),
                    end: None,
                }),
            },
            fundamental: debt.map(|d| fundamental(&firm, d)),
        }
    }

    /// Three securities over nine months with different volatility and leverage.
    fn panel() -> Vec<MergedObservation> {
        let mut rows = Vec::new();
        for m in 1..=9 {
            let wobble = if m % 2 == 0 { 1.0 } else { -1.0 };
            rows.push(row(1, m, 0.01 + 0.01 * wobble, Some(10.0)));
            rows.push(row(2, m, 0.01 + 0.05 * wobble, Some(50.0)));
            rows.push(row(3, m, 0.01 + 0.03 * wobble, None));
        }
        rows
    }

    #[test]
    fn test_score_formula() {
        let outcome = QualityScorer::default().score(panel()).unwrap();
        for r in &outcome.rows {
            match (r.leverage_z, r.volatility_z) {
                (Some(l), Some(v)) => {
                    assert_relative_eq!(r.quality_score.unwrap(), -0.5 * l - 0.5 * v, epsilon = 1e-12);
                }
                _ => assert_eq!(r.quality_score, None),
            }
            assert_eq!(r.quality_quintile, None);
        }
    }

    #[test]
    fn test_global_standardization() {
        let outcome = QualityScorer::default().score(panel()).unwrap();
        let z: Vec<f64> = outcome.rows.iter().filter_map(|r| r.leverage_z).collect();
        let m = sagres_traits::stats::moments(&z);
        assert_relative_eq!(m.mean, 0.0, epsilon = 1e-12);
        assert_relative_eq!(m.std, 1.0, epsilon = 1e-12);
        assert_eq!(outcome.stats.n_with_leverage, 18);
        assert_relative_eq!(outcome.stats.leverage.mean, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_low_leverage_low_vol_scores_highest() {
        let outcome = QualityScorer::default().score(panel()).unwrap();
        let last_month: Vec<_> = outcome
            .rows
            .iter()
            .filter(|r| r.observation().date == month_end(Date::from_ymd_opt(2020, 9, 1).unwrap()))
            .collect();
        let score_of = |id| {
            last_month
                .iter()
                .find(|r| r.observation().security_id == id)
                .and_then(|r| r.quality_score)
        };
        assert!(score_of(1).unwrap() > score_of(2).unwrap());
        // no fundamentals, no score
        assert_eq!(score_of(3), None);
    }

    #[test]
    fn test_rows_survive_without_score() {
        let outcome = QualityScorer::default().score(panel()).unwrap();
        assert_eq!(outcome.rows.len(), 27);
        // volatility needs six prior returns: months 7..=9 for securities 1 and 2
        assert_eq!(outcome.stats.n_scored, 6);
        assert_eq!(outcome.stats.n_with_volatility, 9);
    }

    #[test]
    fn test_constant_leverage_gives_zero_z() {
        let rows: Vec<_> = (1..=9)
            .flat_map(|m| [row(1, m, 0.01 * f64::from(m), Some(20.0)), row(2, m, 0.02, Some(20.0))])
            .collect();
        let outcome = QualityScorer::default().score(rows).unwrap();
        assert!(!outcome.stats.leverage.applied);
        assert!(outcome.rows.iter().all(|r| r.leverage_z == Some(0.0)));
    }
}
