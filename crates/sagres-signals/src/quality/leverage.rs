//! Leverage quality signal.

use sagres_traits::{FundamentalRecord, MergedObservation, Result, Signal};

/// Book leverage: total debt over total assets.
///
/// Null when the row has no fundamentals, when any input is missing, or when
/// total assets are zero.
///
/// # Example
///
/// ```ignore
/// use sagres_signals::Leverage;
/// use sagres_traits::Signal;
///
/// let values = Leverage.compute(&panel)?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Leverage;

impl Leverage {
    /// Leverage of a single fundamentals report.
    pub fn ratio(record: &FundamentalRecord) -> Option<f64> {
        let assets = record.total_assets.filter(|a| *a != 0.0)?;
        let leverage = record.total_debt()? / assets;
        leverage.is_finite().then_some(leverage)
    }
}

impl Signal for Leverage {
    fn name(&self) -> &str {
        "leverage"
    }

    fn compute(&self, panel: &[MergedObservation]) -> Result<Vec<Option<f64>>> {
        Ok(panel
            .iter()
            .map(|row| row.fundamental.as_ref().and_then(Self::ratio))
            .collect())
    }

    fn lookback(&self) -> usize {
        0
    }
}
