//! Point-in-Time Merger.
//!
//! Attaches to every linked return the latest fundamentals report that was
//! already at least `lag_months` old on the return date. Matching runs per
//! firm; reports never cross firms.

use crate::{
    asof::{merge_backward, sorted_groups},
    parallel::map_groups_aligned,
};
use sagres_traits::{
    Date, FundamentalRecord, LinkedReturn, MergedObservation, Result, SagresError, months_before,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Configuration for the point-in-time merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergerConfig {
    /// Calendar months a report must age before it may be used
    pub lag_months: u32,
}

impl Default for MergerConfig {
    fn default() -> Self {
        Self { lag_months: 12 }
    }
}

/// Counts describing one merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    /// Rows processed
    pub n_rows: usize,
    /// Rows carrying a firm identifier
    pub n_with_firm: usize,
    /// Rows matched to a fundamentals report
    pub n_with_fundamentals: usize,
    /// Distinct firms with at least one report
    pub n_firms: usize,
}

/// Output of [`PointInTimeMerger::merge`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// One row per linked return, in input order
    pub rows: Vec<MergedObservation>,
    /// Pass statistics
    pub stats: MergeStats,
}

/// Lagged backward as-of merge of fundamentals onto linked returns.
#[derive(Debug, Clone, Default)]
pub struct PointInTimeMerger {
    config: MergerConfig,
}

impl PointInTimeMerger {
    /// Create a merger with the given configuration.
    #[must_use]
    pub const fn new(config: MergerConfig) -> Self {
        Self { config }
    }

    /// The configured lag.
    #[must_use]
    pub const fn lag_months(&self) -> u32 {
        self.config.lag_months
    }

    /// Latest report date usable for a return dated `date`.
    pub fn cutoff(&self, date: Date) -> Option<Date> {
        months_before(date, self.config.lag_months)
    }

    /// Attach lagged fundamentals to every row.
    ///
    /// Rows without a firm, or whose firm has no report old enough, are kept
    /// with null fundamentals.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::JoinEmpty`] if no row receives fundamentals.
    pub fn merge(
        &self,
        linked: Vec<LinkedReturn>,
        fundamentals: &[FundamentalRecord],
    ) -> Result<MergeOutcome> {
        let reports = sorted_groups(fundamentals, |f| f.firm_id.as_str(), |f| f.report_date);

        let matched: Vec<Option<&FundamentalRecord>> =
            map_groups_aligned(&linked, |row| row.firm_id.as_deref(), |firm, positions| {
                let Some(firm_reports) = firm.and_then(|id| reports.get(id)) else {
                    return vec![None; positions.len()];
                };

                let mut order: Vec<(Option<Date>, usize)> = positions
                    .iter()
                    .enumerate()
                    .map(|(slot, &i)| (self.cutoff(linked[i].observation.date), slot))
                    .collect();
                order.sort();

                // A missing cutoff sorts first and never matches.
                let dated: Vec<(Date, usize)> = order
                    .iter()
                    .filter_map(|&(cutoff, slot)| cutoff.map(|c| (c, slot)))
                    .collect();
                let cutoffs: Vec<Date> = dated.iter().map(|(c, _)| *c).collect();
                let hits = merge_backward(&cutoffs, firm_reports, |f| f.report_date);

                let mut out = vec![None; positions.len()];
                for ((_, slot), hit) in dated.iter().zip(hits) {
                    out[*slot] = hit.map(|j| firm_reports[j]);
                }
                out
            });

        let stats = MergeStats {
            n_rows: linked.len(),
            n_with_firm: linked.iter().filter(|r| r.firm_id.is_some()).count(),
            n_with_fundamentals: matched.iter().filter(|m| m.is_some()).count(),
            n_firms: reports.len(),
        };

        if stats.n_with_fundamentals == 0 {
            return Err(SagresError::JoinEmpty(format!(
                "no linked row has fundamentals reported at least {} months earlier \
                 ({} rows, {} linked, {} firms with reports)",
                self.config.lag_months, stats.n_rows, stats.n_with_firm, stats.n_firms
            )));
        }

        let matched: Vec<Option<FundamentalRecord>> =
            matched.into_iter().map(|m| m.cloned()).collect();
        let rows = linked
            .into_iter()
            .zip(matched)
            .map(|(linked, fundamental)| MergedObservation {
                linked,
                fundamental,
            })
            .collect();

        info!(
            rows = stats.n_rows,
            with_fundamentals = stats.n_with_fundamentals,
            lag_months = self.config.lag_months,
            "merged lagged fundamentals"
        );

        Ok(MergeOutcome { rows, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sagres_traits::{LinkInterval, ReturnObservation, SecurityId};

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    fn linked(security_id: SecurityId, d: Date, firm: Option<&str>) -> LinkedReturn {
        LinkedReturn {
            observation: ReturnObservation {
                security_id,
                date: d,
                ret: Some(0.01),
                shares_outstanding: None,
                price: None,
            },
            firm_id: firm.map(str::to_string),
            link: firm.map(|_| LinkInterval {
                start: date(1990, 1, 1),
                end: None,
            }),
        }
    }

    fn report(firm: &str, d: Date, total_assets: f64) -> FundamentalRecord {
        FundamentalRecord {
            firm_id: firm.to_string(),
            report_date: d,
            total_assets: Some(total_assets),
            long_term_debt: Some(10.0),
            current_debt: Some(5.0),
            revenue: None,
            cost_of_goods_sold: None,
            sga: None,
            return_on_assets: None,
        }
    }

    #[test]
    fn test_one_year_lag() {
        let merger = PointInTimeMerger::default();
        let fundamentals = [
            report("A", date(2019, 12, 31), 100.0),
            report("A", date(2020, 12, 31), 200.0),
        ];
        let rows = vec![
            linked(1, date(2020, 12, 31), Some("A")),
            linked(1, date(2021, 11, 30), Some("A")),
            linked(1, date(2021, 12, 31), Some("A")),
        ];
        let outcome = merger.merge(rows, &fundamentals).unwrap();
        let assets: Vec<_> = outcome
            .rows
            .iter()
            .map(|r| r.fundamental.as_ref().and_then(|f| f.total_assets))
            .collect();
        assert_eq!(assets, vec![Some(100.0), Some(100.0), Some(200.0)]);
    }

    #[test]
    fn test_no_report_old_enough_keeps_row() {
        let merger = PointInTimeMerger::default();
        let fundamentals = [
            report("A", date(2015, 12, 31), 100.0),
            report("B", date(2020, 6, 30), 50.0),
        ];
        let rows = vec![
            linked(1, date(2016, 12, 31), Some("A")),
            linked(2, date(2021, 1, 31), Some("B")),
            linked(3, date(2021, 1, 31), None),
        ];
        let outcome = merger.merge(rows, &fundamentals).unwrap();
        assert_eq!(outcome.rows.len(), 3);
        assert!(outcome.rows[0].fundamental.is_some());
        assert!(outcome.rows[1].fundamental.is_none());
        assert!(outcome.rows[2].fundamental.is_none());
        assert_eq!(outcome.stats.n_with_firm, 2);
        assert_eq!(outcome.stats.n_with_fundamentals, 1);
    }

    #[test]
    fn test_reports_never_cross_firms() {
        let merger = PointInTimeMerger::default();
        let fundamentals = [
            report("A", date(2010, 12, 31), 100.0),
            report("B", date(2018, 12, 31), 999.0),
        ];
        let rows = vec![linked(1, date(2020, 6, 30), Some("A"))];
        let outcome = merger.merge(rows, &fundamentals).unwrap();
        let f = outcome.rows[0].fundamental.as_ref().unwrap();
        assert_eq!(f.firm_id, "A");
        assert_eq!(f.total_assets, Some(100.0));
    }

    #[test]
    fn test_unsorted_input_order_preserved() {
        let merger = PointInTimeMerger::default();
        let fundamentals = [
            report("A", date(2012, 12, 31), 3.0),
            report("A", date(2010, 12, 31), 1.0),
            report("A", date(2011, 12, 31), 2.0),
        ];
        let rows = vec![
            linked(1, date(2014, 1, 31), Some("A")),
            linked(1, date(2012, 1, 31), Some("A")),
            linked(1, date(2013, 1, 31), Some("A")),
        ];
        let outcome = merger.merge(rows, &fundamentals).unwrap();
        let assets: Vec<_> = outcome
            .rows
            .iter()
            .map(|r| r.fundamental.as_ref().and_then(|f| f.total_assets))
            .collect();
        assert_eq!(assets, vec![Some(3.0), Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_matched_report_is_at_least_a_year_old() {
        let merger = PointInTimeMerger::default();
        let fundamentals: Vec<_> = (2000..2020)
            .flat_map(|y| [3, 6, 9, 12].map(|m| report("A", sagres_traits::month_end(date(y, m, 1)), 1.0)))
            .collect();
        let rows: Vec<_> = (2002..2020)
            .flat_map(|y| (1..=12).map(move |m| linked(1, sagres_traits::month_end(date(y, m, 1)), Some("A"))))
            .collect();
        let outcome = merger.merge(rows, &fundamentals).unwrap();
        for row in &outcome.rows {
            let f = row.fundamental.as_ref().unwrap();
            assert!(f.report_date <= row.observation().date - Duration::days(365));
        }
    }

    #[test]
    fn test_nothing_matches_is_join_empty() {
        let merger = PointInTimeMerger::new(MergerConfig { lag_months: 12 });
        let fundamentals = [report("A", date(2020, 12, 31), 1.0)];
        let rows = vec![linked(1, date(2021, 1, 31), Some("A"))];
        assert!(matches!(
            merger.merge(rows, &fundamentals),
            Err(SagresError::JoinEmpty(_))
        ));
    }
}
