//! One-sample t-test of the spread mean.

use sagres_traits::{
    DegenerateReason, Result, SagresError,
    stats::{MIN_STD_THRESHOLD, moments, student_t_two_sided_p},
};
use serde::{Deserialize, Serialize};

/// Result of a two-sided one-sample t-test against a zero mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    /// Sample mean
    pub mean: f64,
    /// Standard error of the mean
    pub std_error: f64,
    /// t-statistic
    pub t_statistic: f64,
    /// Two-sided p-value, Student-t with `n_obs - 1` degrees of freedom
    pub p_value: f64,
    /// Number of observations used
    pub n_obs: usize,
}

impl TTestResult {
    /// Metric name used in errors and reports.
    pub const METRIC: &'static str = "t_test";

    /// Test whether the mean of `values` differs from zero.
    ///
    /// Non-finite values are dropped first.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::DegenerateSample`] with fewer than two values or
    /// zero variance.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sagres_eval::TTestResult;
    ///
    /// let result = TTestResult::calculate(&[0.01, 0.03, 0.02, 0.04]).unwrap();
    /// assert!(result.t_statistic > 0.0);
    /// assert!(TTestResult::calculate(&[0.01]).is_err());
    /// ```
    pub fn calculate(values: &[f64]) -> Result<Self> {
        let m = moments(values);
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

        let std_error = m.std / (m.n_obs as f64).sqrt();
        let t_statistic = m.mean / std_error;
        Ok(Self {
            mean: m.mean,
            std_error,
            t_statistic,
            p_value: student_t_two_sided_p(t_statistic, (m.n_obs - 1) as f64),
            n_obs: m.n_obs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_values() {
        let result = TTestResult::calculate(&[0.01, -0.01, 0.02, 0.00, 0.01, -0.02]).unwrap();
        assert_eq!(result.n_obs, 6);
        assert_relative_eq!(result.mean, 0.01 / 6.0, epsilon = 1e-15);
        assert_relative_eq!(result.t_statistic, 0.277_350_098_112_614_5, epsilon = 1e-9);
        assert_relative_eq!(result.p_value, 0.792_612_870_667, epsilon = 1e-6);
    }

    #[test]
    fn test_nan_dropped() {
        let with_nan = TTestResult::calculate(&[0.01, f64::NAN, 0.03]).unwrap();
        let without = TTestResult::calculate(&[0.01, 0.03]).unwrap();
        assert_eq!(with_nan, without);
    }

    #[test]
    fn test_insufficient_sample() {
        let err = TTestResult::calculate(&[0.05]).unwrap_err();
        assert!(matches!(
            err,
            SagresError::DegenerateSample {
                reason: DegenerateReason::InsufficientSample { n_obs: 1 },
                ..
            }
        ));
    }

    #[test]
    fn test_zero_variance() {
        let err = TTestResult::calculate(&[0.02, 0.02, 0.02]).unwrap_err();
        assert!(matches!(
            err,
            SagresError::DegenerateSample {
                reason: DegenerateReason::ZeroVariance,
                ..
            }
        ));
    }
}
