//! Monthly quintile assignment.
//!
//! Each month's non-null scores are cut at their empirical 0/20/40/60/80/100th
//! percentiles into right-closed bins labeled 1 (lowest) through 5 (highest).
//! Two tolerances keep sparse months usable:
//!
//! - A month with fewer than two distinct scores puts every row in bucket 3.
//! - Duplicate cut-points are dropped, so a month may have fewer than five
//!   buckets, labeled consecutively from 1.

use sagres_panel::map_groups;
use sagres_traits::{Month, ScoredObservation, stats::quantile_sorted};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Configuration for quintile assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuintileConfig {
    /// Number of quantile buckets (default: 5)
    pub n_buckets: u8,
    /// Bucket assigned to every row of a degenerate month (default: 3)
    pub degenerate_bucket: u8,
}

impl Default for QuintileConfig {
    fn default() -> Self {
        Self {
            n_buckets: 5,
            degenerate_bucket: 3,
        }
    }
}

/// How a single month was bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthBucketing {
    /// No row had a score
    Empty,
    /// Fewer than two distinct scores; every row got the degenerate bucket
    Degenerate,
    /// Quantile cut with this many effective buckets
    Cut {
        /// Buckets left after dropping duplicate cut-points
        n_buckets: u8,
    },
}

/// Counts describing one assignment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuintileStats {
    /// Months seen
    pub n_months: usize,
    /// Rows given a bucket
    pub n_assigned: usize,
    /// Months assigned the degenerate bucket
    pub degenerate_months: Vec<Month>,
    /// Months with fewer buckets than configured
    pub collapsed_months: Vec<Month>,
}

/// Assigns each scored row to a bucket within its month.
#[derive(Debug, Clone, Default)]
pub struct QuintileAssigner {
    config: QuintileConfig,
}

impl QuintileAssigner {
    /// Create a new assigner with the given configuration.
    #[must_use]
    pub const fn new(config: QuintileConfig) -> Self {
        Self { config }
    }

    /// Cut-points of ascending `sorted` scores with duplicates removed.
    pub fn cut_points(&self, sorted: &[f64]) -> Vec<f64> {
        let n = f64::from(self.config.n_buckets);
        let mut edges: Vec<f64> = (0..=self.config.n_buckets)
            .map(|i| quantile_sorted(sorted, f64::from(i) / n))
            .collect();
        edges.dedup();
        edges
    }

    /// Bucket labels for the scores of one month, aligned with the input.
    ///
    /// Returns the labels and how the month was bucketed.
    ///
    /// # Example
    ///
    /// ```
    /// use sagres_eval::QuintileAssigner;
    ///
    /// let assigner = QuintileAssigner::default();
    /// let (labels, _) = assigner.bucket(&[0.5, -1.0, 2.0, 0.0, 1.0]);
    /// assert_eq!(labels, vec![3, 1, 5, 2, 4]);
    ///
    /// let (labels, _) = assigner.bucket(&[0.7, 0.7]);
    /// assert_eq!(labels, vec![3, 3]);
    /// ```
    pub fn bucket(&self, scores: &[f64]) -> (Vec<u8>, MonthBucketing) {
        if scores.is_empty() {
            return (Vec::new(), MonthBucketing::Empty);
        }

        let mut sorted = scores.to_vec();
        sorted.sort_by(f64::total_cmp);
        let distinct = 1 + sorted.windows(2).filter(|w| w[0] != w[1]).count();
        if distinct < 2 {
            return (
                vec![self.config.degenerate_bucket; scores.len()],
                MonthBucketing::Degenerate,
            );
        }

        let edges = self.cut_points(&sorted);
        let n_buckets = edges.len() - 1;
        let inner = &edges[1..n_buckets];
        let labels = scores
            .iter()
            .map(|&x| {
                // Right-closed bins; the lowest bin also holds the minimum.
                let bin = inner.partition_point(|&edge| edge < x);
                (bin + 1) as u8
            })
            .collect();

        (
            labels,
            MonthBucketing::Cut {
                n_buckets: n_buckets as u8,
            },
        )
    }

    /// Assign `quality_quintile` to every row with a score, month by month.
    ///
    /// Rows without a score keep a null bucket.
    pub fn assign(&self, rows: &mut [ScoredObservation]) -> QuintileStats {
        let per_month = map_groups(
            rows,
            |r| r.observation().month(),
            |_, positions| {
                let (scored, scores): (Vec<usize>, Vec<f64>) = positions
                    .iter()
                    .filter_map(|&i| rows[i].quality_score.map(|s| (i, s)))
                    .filter(|(_, s)| s.is_finite())
                    .unzip();
                let (labels, bucketing) = self.bucket(&scores);
                (scored.into_iter().zip(labels).collect::<Vec<_>>(), bucketing)
            },
        );

        let mut stats = QuintileStats {
            n_months: per_month.len(),
            ..QuintileStats::default()
        };
        let mut assignments = Vec::new();
        for (month, (labels, bucketing)) in per_month {
            match bucketing {
                MonthBucketing::Degenerate => {
                    debug!(%month, rows = labels.len(), "degenerate month, single bucket");
                    stats.degenerate_months.push(month);
                }
                MonthBucketing::Cut { n_buckets } if n_buckets < self.config.n_buckets => {
                    debug!(%month, n_buckets, "duplicate cut-points collapsed buckets");
                    stats.collapsed_months.push(month);
                }
                _ => {}
            }
            stats.n_assigned += labels.len();
            assignments.extend(labels);
        }

        for row in rows.iter_mut() {
            row.quality_quintile = None;
        }
        for (i, label) in assignments {
            rows[i].quality_quintile = Some(label);
        }

        info!(
            months = stats.n_months,
            assigned = stats.n_assigned,
            degenerate = stats.degenerate_months.len(),
            collapsed = stats.collapsed_months.len(),
            "assigned quintiles"
        );
        stats
    }
}
