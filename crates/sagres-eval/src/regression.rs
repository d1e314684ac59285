//! Intercept-only regression of the spread series.
//!
//! Fits `y = alpha + e` by ordinary least squares on a design matrix holding a
//! single column of ones. The intercept equals the sample mean; the fit is kept
//! as its own diagnostic alongside the t-test.

use ndarray::{Array1, Array2};
use sagres_traits::{
    DegenerateReason, Result, SagresError,
    stats::{MIN_STD_THRESHOLD, student_t_two_sided_p},
};
use serde::{Deserialize, Serialize};

/// Result of an intercept-only OLS fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Estimated intercept
    pub intercept: f64,
    /// Standard error of the intercept
    pub std_error: f64,
    /// t-statistic of the intercept
    pub t_statistic: f64,
    /// Two-sided p-value of the intercept
    pub p_value: f64,
    /// Coefficient of determination (zero for a constant-only model)
    pub r_squared: f64,
    /// Number of observations
    pub n_obs: usize,
    /// Residual degrees of freedom
    pub df_residual: usize,
}

impl RegressionResult {
    /// Metric name used in errors and reports.
    pub const METRIC: &'static str = "regression";

    /// Fit the intercept-only model to `values`.
    ///
    /// Non-finite values are dropped first.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::DegenerateSample`] with fewer than two values or
    /// zero residual variance.
    pub fn fit(values: &[f64]) -> Result<Self> {
        let y: Array1<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let n_obs = y.len();
        if n_obs < 2 {
            return Err(SagresError::degenerate(
                Self::METRIC,
                DegenerateReason::InsufficientSample { n_obs },
            ));
        }

        let x = Array2::<f64>::ones((n_obs, 1));
        let xtx = x.t().dot(&x)[[0, 0]];
        let xty = x.t().dot(&y)[0];
        let intercept = xty / xtx;

        let residuals = &y - &x.dot(&Array1::from_elem(1, intercept));
        let ssr = residuals.dot(&residuals);
        let df_residual = n_obs - 1;
        let sigma2 = ssr / df_residual as f64;
        if sigma2.sqrt() <= MIN_STD_THRESHOLD {
            return Err(SagresError::degenerate(
                Self::METRIC,
                DegenerateReason::ZeroVariance,
            ));
        }

        let std_error = (sigma2 / xtx).sqrt();
        let t_statistic = intercept / std_error;

        let y_mean = y.mean().unwrap_or(intercept);
        let tss = y.mapv(|v| (v - y_mean).powi(2)).sum();
        let r_squared = 1.0 - ssr / tss;

        Ok(Self {
            intercept,
            std_error,
            t_statistic,
            p_value: student_t_two_sided_p(t_statistic, df_residual as f64),
            r_squared,
            n_obs,
            df_residual,
        })
    }
}
