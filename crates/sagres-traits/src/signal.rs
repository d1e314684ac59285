//! Signal trait for per-row panel characteristics.
//!
//! A `Signal` reads the merged panel and produces one raw value per row
//! (leverage, trailing volatility, ...). Standardization and combination into
//! a composite score happen downstream, so signals stay free of cross-sectional
//! state.

use crate::{MergedObservation, Result};

/// A firm or security characteristic computed over the merged panel.
///
/// Implementations should be thread-safe (`Send + Sync`) so that several
/// signals can be evaluated in parallel over the same panel.
///
/// # Output Alignment
///
/// [`Signal::compute`] must return exactly one value per input row, in input
/// order. `None` marks rows where the characteristic is undefined (missing
/// fundamentals, too little history, division by zero); such rows later get a
/// null composite score but remain in the panel.
///
/// # Example
///
/// ```no_run
/// use sagres_traits::{MergedObservation, Result, Signal};
///
/// struct PriceLevel;
///
/// impl Signal for PriceLevel {
///     fn name(&self) -> &str {
///         "price_level"
///     }
///
///     fn compute(&self, panel: &[MergedObservation]) -> Result<Vec<Option<f64>>> {
///         Ok(panel.iter().map(|row| row.observation().price).collect())
///     }
///
///     fn lookback(&self) -> usize {
///         0
///     }
/// }
/// ```
pub trait Signal: Send + Sync {
    /// Returns the name of this signal.
    ///
    /// The name is used as the column name in reports and in log messages.
    fn name(&self) -> &str;

    /// Computes the raw characteristic for every row of the panel.
    ///
    /// # Errors
    ///
    /// Returns an error if the panel is malformed for this signal. Missing
    /// inputs on individual rows are not errors; they produce `None`.
    fn compute(&self, panel: &[MergedObservation]) -> Result<Vec<Option<f64>>>;

    /// Number of prior monthly observations the signal reads per security.
    ///
    /// Zero for point-in-time characteristics such as leverage.
    fn lookback(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Date, LinkedReturn, ReturnObservation};

    struct PriceLevel;

    impl Signal for PriceLevel {
        fn name(&self) -> &str {
            "price_level"
        }

        fn compute(&self, panel: &[MergedObservation]) -> Result<Vec<Option<f64>>> {
            Ok(panel.iter().map(|row| row.observation().price).collect())
        }

        fn lookback(&self) -> usize {
            0
        }
    }

    fn row(price: Option<f64>) -> MergedObservation {
        MergedObservation {
            linked: LinkedReturn {
                observation: ReturnObservation {
                    security_id: 10001,
                    date: Date::from_ymd_opt(2020, 1, 31).unwrap(),
                    ret: Some(0.01),
                    shares_outstanding: Some(1_000.0),
                    price,
                },
                firm_id: None,
                link: None,
            },
            fundamental: None,
        }
    }

    #[test]
    fn test_signal_is_object_safe() {
        let signals: Vec<Box<dyn Signal>> = vec![Box::new(PriceLevel)];
        let panel = vec![row(Some(12.5)), row(None)];

        let values = signals[0].compute(&panel).unwrap();
        assert_eq!(signals[0].name(), "price_level");
        assert_eq!(signals[0].lookback(), 0);
        assert_eq!(values, vec![Some(12.5), None]);
    }
}
