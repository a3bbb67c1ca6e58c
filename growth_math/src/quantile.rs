//! Empirical quantiles
//!
//! Quantiles use linear interpolation between the closest ranks: for `n`
//! sorted samples the position of level `q` is `(n - 1) * q`.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Quantile of `samples` at level `q` in `[0, 1]`
pub fn quantile(samples: &[f64], q: f64) -> Result<f64> {
    let sorted = sorted_finite(samples)?;
    interpolate(&sorted, q)
}

/// A lower/upper pair of quantiles taken from one sample set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantileRange {
    /// Value at the lower level
    pub lower: f64,
    /// Value at the upper level
    pub upper: f64,
}

impl QuantileRange {
    /// Compute both quantiles with a single sort of the samples
    pub fn from_samples(samples: &[f64], lower_q: f64, upper_q: f64) -> Result<Self> {
        if lower_q > upper_q {
            return Err(MathError::InvalidInput(format!(
                "Lower quantile level {} exceeds upper level {}",
                lower_q, upper_q
            )));
        }

        let sorted = sorted_finite(samples)?;

        Ok(Self {
            lower: interpolate(&sorted, lower_q)?,
            upper: interpolate(&sorted, upper_q)?,
        })
    }

    /// Check whether `value` lies inside the closed range
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

fn sorted_finite(samples: &[f64]) -> Result<Vec<f64>> {
    if samples.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take a quantile of an empty sample".to_string(),
        ));
    }

    if samples.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Quantile samples must be finite".to_string(),
        ));
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(sorted)
}

fn interpolate(sorted: &[f64], q: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Quantile level must be between 0 and 1, got {}",
            q
        )));
    }

    let position = (sorted.len() - 1) as f64 * q;
    let lo = position.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let fraction = position - lo as f64;

    Ok(sorted[lo] + fraction * (sorted[hi] - sorted[lo]))
}
