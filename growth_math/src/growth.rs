//! Growth-rate calculations
//!
//! Contains the compounding primitives used to project a series forward:
//! - Compound Annual Growth Rate (CAGR)
//! - Rate clamping
//! - Compounding from a fixed anchor
//! - Year-over-year ratios

use crate::{MathError, Result};

/// Compound annual growth rate between two observations `periods` years apart.
///
/// Returns `0.0` when either endpoint is non-positive, since no growth rate
/// is defined there. Non-finite inputs propagate into a non-finite result, so
/// callers decide how to treat them.
pub fn compound_annual_growth(start: f64, end: f64, periods: u32) -> Result<f64> {
    if periods == 0 {
        return Err(MathError::InvalidInput(
            "Growth period must span at least one year".to_string(),
        ));
    }

    if start <= 0.0 || end <= 0.0 {
        return Ok(0.0);
    }

    Ok((end / start).powf(1.0 / periods as f64) - 1.0)
}

/// Clamp a growth rate into `[min, max]`.
///
/// The upper bound is applied first, so a degenerate range (`min > max`)
/// resolves to `min`.
pub fn clamp_rate(rate: f64, min: f64, max: f64) -> f64 {
    rate.min(max).max(min)
}

/// Compound `base` forward by `periods` years at a constant `rate`
pub fn compound(base: f64, rate: f64, periods: i32) -> f64 {
    base * (1.0 + rate).powi(periods)
}

/// Ratios `curr / prev` for each consecutive pair of an ordered series.
///
/// Pairs with a non-positive or non-finite previous value, or a non-finite
/// current value, are skipped.
pub fn year_over_year_ratios(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|pair| pair[0] > 0.0 && pair[0].is_finite() && pair[1].is_finite())
        .map(|pair| pair[1] / pair[0])
        .collect()
}
