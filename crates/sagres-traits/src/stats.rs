//! Statistical utility functions shared by the scorer and the evaluator.
//!
//! This module provides z-score standardization over nullable panels, sample
//! moments, a row-based rolling standard deviation, empirical quantiles and the
//! Student-t tail probability used by the significance tests.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Minimum threshold for standard deviation to avoid division by zero.
/// Values below this threshold are treated as zero variance.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Z-score standardization result containing computed statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardizeResult {
    /// The computed mean of the input values.
    pub mean: f64,
    /// The computed sample standard deviation (N-1 denominator).
    pub std: f64,
    /// Number of finite values the statistics were taken over.
    pub n_obs: usize,
    /// Whether the standardization was applied (false if variance was too low).
    pub applied: bool,
}

/// Sample mean and standard deviation of a set of finite values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleMoments {
    /// Number of observations
    pub n_obs: usize,
    /// Arithmetic mean (NaN when empty)
    pub mean: f64,
    /// Sample standard deviation with N-1 denominator (NaN when fewer than 2)
    pub std: f64,
}

/// Compute the sample mean and standard deviation of `values`.
///
/// Non-finite values are skipped.
///
/// # Examples
///
/// ```
/// use sagres_traits::stats::moments;
///
/// let m = moments(&[1.0, 2.0, 3.0]);
/// assert_eq!(m.n_obs, 3);
/// assert!((m.mean - 2.0).abs() < 1e-12);
/// assert!((m.std - 1.0).abs() < 1e-12);
/// ```
pub fn moments(values: &[f64]) -> SampleMoments {
    let finite: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    let n_obs = finite.len();
    if n_obs == 0 {
        return SampleMoments {
            n_obs,
            mean: f64::NAN,
            std: f64::NAN,
        };
    }

    let mean = finite.iter().sum::<f64>() / n_obs as f64;
    let std = if n_obs > 1 {
        // Sample variance with N-1 denominator (Bessel's correction)
        (finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n_obs - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    SampleMoments { n_obs, mean, std }
}

/// Standardize a nullable column to z-scores using statistics taken over all
/// of its non-null values.
///
/// `None` and non-finite inputs stay `None`. If the standard deviation is below
/// [`MIN_STD_THRESHOLD`] (including the single-value case), every non-null
/// value maps to `0.0` and `applied` is false.
///
/// # Examples
///
/// ```
/// use sagres_traits::stats::standardize;
///
/// let (z, result) = standardize(&[Some(1.0), None, Some(3.0)]);
/// assert!(result.applied);
/// assert_eq!(z[1], None);
/// assert!((z[0].unwrap() + z[2].unwrap()).abs() < 1e-12);
/// ```
pub fn standardize(values: &[Option<f64>]) -> (Vec<Option<f64>>, StandardizeResult) {
    let finite: Vec<f64> = values
        .iter()
        .filter_map(|v| v.filter(|x| x.is_finite()))
        .collect();
    let m = moments(&finite);
    let applied = m.n_obs > 1 && m.std > MIN_STD_THRESHOLD;

    let standardized = values
        .iter()
        .map(|v| {
            v.filter(|x| x.is_finite())
                .map(|x| if applied { (x - m.mean) / m.std } else { 0.0 })
        })
        .collect();

    (
        standardized,
        StandardizeResult {
            mean: m.mean,
            std: m.std,
            n_obs: m.n_obs,
            applied,
        },
    )
}

/// Row-based rolling sample standard deviation over a nullable series.
///
/// The window at position `i` covers rows `i + 1 - window ..= i`. The result is
/// `None` unless the window holds at least `min_periods` non-null values;
/// nulls inside the window are skipped rather than treated as zero.
pub fn rolling_std(values: &[Option<f64>], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    let min_periods = min_periods.max(2);
    (0..values.len())
        .map(|i| {
            let lo = (i + 1).saturating_sub(window);
            let in_window: Vec<f64> = values[lo..=i]
                .iter()
                .filter_map(|v| v.filter(|x| x.is_finite()))
                .collect();
            if in_window.len() < min_periods {
                return None;
            }
            Some(moments(&in_window).std)
        })
        .collect()
}

/// Empirical quantile of ascending-sorted values with linear interpolation.
///
/// Returns NaN for an empty slice. `q` is clamped to `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    let h = (n - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Two-sided tail probability `P(|T| > |t|)` of a Student-t with `df` degrees
/// of freedom.
///
/// Returns NaN for non-positive `df` or NaN `t`.
///
/// # Examples
///
/// ```
/// use sagres_traits::stats::student_t_two_sided_p;
///
/// // Cauchy: P(|T| > 1) = 0.5
/// assert!((student_t_two_sided_p(1.0, 1.0) - 0.5).abs() < 1e-10);
/// ```
pub fn student_t_two_sided_p(t: f64, df: f64) -> f64 {
    if t.is_nan() {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * dist.sf(t.abs())).min(1.0),
        Err(_) => f64::NAN,
    }
}
