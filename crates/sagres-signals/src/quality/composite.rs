//! Inverted equal-weight combination of standardized signals.

use sagres_traits::{Result, SagresError};
use serde::{Deserialize, Serialize};

/// A named column of standardized signal values, one per panel row.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalScore {
    /// Signal name
    pub name: String,
    /// Z-scores, `None` where the signal is undefined
    pub scores: Vec<Option<f64>>,
}

/// Configuration for the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeConfig {
    /// Negate the average so that low input values score high (default: true)
    pub invert: bool,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self { invert: true }
    }
}

/// Averages standardized signals with equal weights, optionally negated.
///
/// With two inputs and inversion this is `-0.5 * a - 0.5 * b`. A row is null
/// if any input is null for it.
///
/// # Examples
///
/// ```rust
/// use sagres_signals::{InvertedEqualWeight, SignalScore};
///
/// let composite = InvertedEqualWeight::default();
/// let scores = composite
///     .combine(&[
///         SignalScore { name: "leverage".into(), scores: vec![Some(1.0), None] },
///         SignalScore { name: "volatility".into(), scores: vec![Some(-3.0), Some(0.5)] },
///     ])
///     .unwrap();
/// assert_eq!(scores, vec![Some(1.0), None]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InvertedEqualWeight {
    config: CompositeConfig,
}

impl InvertedEqualWeight {
    /// Create a new composite with the given configuration.
    #[must_use]
    pub const fn new(config: CompositeConfig) -> Self {
        Self { config }
    }

    /// Combine the signals row by row.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::InvalidData`] when no signals are given or their
    /// lengths differ.
    pub fn combine(&self, signals: &[SignalScore]) -> Result<Vec<Option<f64>>> {
        let Some(first) = signals.first() else {
            return Err(SagresError::InvalidData(
                "cannot combine zero signals".to_string(),
            ));
        };
        let n_rows = first.scores.len();

        for signal in signals {
            if signal.scores.len() != n_rows {
                return Err(SagresError::InvalidData(format!(
                    "signal '{}' has {} rows, expected {}",
                    signal.name,
                    signal.scores.len(),
                    n_rows
                )));
            }
        }

        let sign = if self.config.invert { -1.0 } else { 1.0 };
        let weight = sign / signals.len() as f64;
        Ok((0..n_rows)
            .map(|i| {
                signals
                    .iter()
                    .map(|s| s.scores[i])
                    .try_fold(0.0, |acc, z| z.map(|z| acc + weight * z))
            })
            .collect())
    }

    /// Get the name of this combiner.
    #[must_use]
    pub const fn name(&self) -> &str {
        "inverted_equal_weight"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn score(name: &str, scores: Vec<Option<f64>>) -> SignalScore {
        SignalScore {
            name: name.to_string(),
            scores,
        }
    }

    #[test]
    fn test_inverted_half_weights() {
        let composite = InvertedEqualWeight::default();
        let result = composite
            .combine(&[
                score("leverage", vec![Some(1.0), Some(-0.4)]),
                score("volatility", vec![Some(0.6), Some(-1.0)]),
            ])
            .unwrap();
        assert_relative_eq!(result[0].unwrap(), -0.8, epsilon = 1e-12);
        assert_relative_eq!(result[1].unwrap(), 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_without_inversion() {
        let composite = InvertedEqualWeight::new(CompositeConfig { invert: false });
        let result = composite
            .combine(&[score("a", vec![Some(2.0)]), score("b", vec![Some(4.0)])])
            .unwrap();
        assert_relative_eq!(result[0].unwrap(), 3.0);
    }

    #[test]
    fn test_any_null_input_is_null() {
        let composite = InvertedEqualWeight::default();
        let result = composite
            .combine(&[
                score("a", vec![None, Some(1.0)]),
                score("b", vec![Some(1.0), None]),
            ])
            .unwrap();
        assert_eq!(result, vec![None, None]);
    }

    #[test]
    fn test_mismatched_lengths() {
        let composite = InvertedEqualWeight::default();
        let result = composite.combine(&[score("a", vec![Some(1.0)]), score("b", vec![])]);
        assert!(matches!(result, Err(SagresError::InvalidData(_))));
    }

    #[test]
    fn test_empty_signals() {
        assert!(InvertedEqualWeight::default().combine(&[]).is_err());
    }
}
