//! Year-over-year capping of raw predictions
//!
//! Each district is a fold over its ascending years. The reference for year
//! `Y` is the capped value of `Y - 1` (the last observed value for the first
//! horizon year), never a raw prediction.

use crate::error::{ForecastError, Result};
use crate::models::RawPrediction;
use crate::stats::GrowthBounds;

/// A raw prediction and its capped value
#[derive(Debug, Clone, PartialEq)]
pub struct CappedPrediction {
    pub district: String,
    pub year: i32,
    pub raw: f64,
    pub capped: f64,
}

/// Cap one step against the previous corrected value.
///
/// A non-positive reference leaves the raw value untouched.
pub fn cap_step(prev: f64, raw: f64, min_ratio: f64, max_ratio: f64) -> f64 {
    if prev <= 0.0 {
        return raw;
    }

    let ratio = raw / prev;
    if ratio > max_ratio {
        prev * max_ratio
    } else if ratio < min_ratio {
        prev * min_ratio
    } else {
        raw
    }
}

/// Cap an ordered sequence of raw values starting from `last_observed`
pub fn cap_values(last_observed: f64, raw: &[f64], bounds: &GrowthBounds) -> Vec<f64> {
    raw.iter()
        .scan(last_observed, |prev, &value| {
            let capped = cap_step(*prev, value, bounds.min_year_ratio, bounds.max_year_ratio);
            *prev = capped;
            Some(capped)
        })
        .collect()
}

/// Applies [`GrowthBounds`] year ratios district by district
#[derive(Debug, Clone, Copy)]
pub struct SequentialCapper {
    bounds: GrowthBounds,
}

impl SequentialCapper {
    /// Create a capper for the run's bounds
    pub fn new(bounds: GrowthBounds) -> Self {
        Self { bounds }
    }

    /// Cap one district's predictions.
    ///
    /// `predictions` must belong to a single district with strictly
    /// ascending years.
    pub fn cap_district(
        &self,
        last_observed: f64,
        predictions: &[RawPrediction],
    ) -> Result<Vec<CappedPrediction>> {
        if let Some(first) = predictions.first() {
            for pair in predictions.windows(2) {
                if pair[1].district != first.district {
                    return Err(ForecastError::DataError(format!(
                        "predictions for '{}' and '{}' passed as one district",
                        first.district, pair[1].district
                    )));
                }
                if pair[1].year <= pair[0].year {
                    return Err(ForecastError::DataError(format!(
                        "predictions for '{}' are not in ascending year order",
                        first.district
                    )));
                }
            }
        }

        let raw: Vec<f64> = predictions.iter().map(|p| p.child_user_raw).collect();
        let capped = cap_values(last_observed, &raw, &self.bounds);

        Ok(predictions
            .iter()
            .zip(capped)
            .map(|(p, capped)| CappedPrediction {
                district: p.district.clone(),
                year: p.year,
                raw: p.child_user_raw,
                capped,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1000.0, 5000.0, 1500.0)]
    #[case(1000.0, 100.0, 800.0)]
    #[case(1000.0, 1200.0, 1200.0)]
    #[case(0.0, 5000.0, 5000.0)]
    #[case(-3.0, 7.0, 7.0)]
    fn test_cap_step(#[case] prev: f64, #[case] raw: f64, #[case] expected: f64) {
        assert_eq!(cap_step(prev, raw, 0.8, 1.5), expected);
    }

    #[test]
    fn test_capped_value_is_next_reference() {
        let bounds = GrowthBounds::new(0.0, 0.1, 0.8, 1.5);
        let capped = cap_values(1000.0, &[1000.0, 5000.0, 2000.0], &bounds);
        // 2025 is judged against the capped 1500, not the raw 5000
        assert_eq!(capped, vec![1000.0, 1500.0, 2000.0]);
    }

    #[test]
    fn test_rejects_unsorted_years() {
        let capper = SequentialCapper::new(GrowthBounds::new(0.0, 0.1, 0.8, 1.5));
        let predictions = vec![
            RawPrediction {
                district: "Mapo".to_string(),
                year: 2024,
                child_user_raw: 1.0,
            },
            RawPrediction {
                district: "Mapo".to_string(),
                year: 2023,
                child_user_raw: 1.0,
            },
        ];
        assert!(capper.cap_district(1.0, &predictions).is_err());
    }
}
