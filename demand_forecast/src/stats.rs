//! Empirical growth bounds
//!
//! The bounds are global to a run: the CAGR range clamps every projected
//! feature growth rate, and the year-ratio range caps every predicted
//! year-over-year step.

use crate::config::{BoundLevels, ProjectionConfig, ProjectionYears};
use crate::data::HistoricalTable;
use crate::error::{ForecastError, Result};
use growth_math::{clamp_rate, compound_annual_growth, year_over_year_ratios, QuantileRange};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Growth bounds derived from the historical `child_user` series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthBounds {
    /// Lower percentile of per-district CAGR
    pub min_cagr: f64,
    /// Upper percentile of per-district CAGR
    pub max_cagr: f64,
    /// Lower percentile of pooled year-over-year ratios
    pub min_year_ratio: f64,
    /// Upper percentile of pooled year-over-year ratios
    pub max_year_ratio: f64,
    /// Number of districts that contributed a CAGR
    pub cagr_samples: usize,
    /// Number of year-over-year ratios pooled
    pub ratio_samples: usize,
}

impl GrowthBounds {
    /// Create bounds directly, without sample counts
    pub fn new(min_cagr: f64, max_cagr: f64, min_year_ratio: f64, max_year_ratio: f64) -> Self {
        Self {
            min_cagr,
            max_cagr,
            min_year_ratio,
            max_year_ratio,
            cagr_samples: 0,
            ratio_samples: 0,
        }
    }

    /// Clamp a growth rate into `[min_cagr, max_cagr]`
    pub fn clamp_cagr(&self, rate: f64) -> f64 {
        clamp_rate(rate, self.min_cagr, self.max_cagr)
    }
}

/// Derives [`GrowthBounds`] from a historical table
#[derive(Debug, Clone)]
pub struct HistoricalStatsEstimator {
    years: ProjectionYears,
    levels: BoundLevels,
}

impl HistoricalStatsEstimator {
    /// Create an estimator for the configured window and percentile levels
    pub fn new(config: &ProjectionConfig) -> Self {
        Self {
            years: config.years,
            levels: config.bounds,
        }
    }

    /// Per-district CAGR of `child_user` between base_year and last_year.
    ///
    /// Districts missing either endpoint, with a non-positive endpoint, or
    /// with a non-finite rate are left out.
    pub fn cagr_samples(&self, table: &HistoricalTable) -> Result<Vec<f64>> {
        let mut samples = Vec::new();
        for district in table.districts() {
            let (Some(start), Some(end)) = (
                table.get(district, self.years.base_year),
                table.get(district, self.years.last_year),
            ) else {
                continue;
            };

            if start.child_user <= 0.0 || end.child_user <= 0.0 {
                continue;
            }

            let rate = compound_annual_growth(start.child_user, end.child_user, self.years.span())?;
            if rate.is_finite() {
                samples.push(rate);
            }
        }
        Ok(samples)
    }

    /// Year-over-year `child_user` ratios pooled across all districts
    pub fn ratio_samples(&self, table: &HistoricalTable) -> Vec<f64> {
        table
            .districts()
            .iter()
            .flat_map(|district| year_over_year_ratios(&table.child_user_series(district)))
            .collect()
    }

    /// Estimate the bounds; fails when either sample set is empty
    pub fn estimate(&self, table: &HistoricalTable) -> Result<GrowthBounds> {
        if table.is_empty() {
            return Err(ForecastError::DegenerateStatistics(
                "historical table is empty".to_string(),
            ));
        }

        let cagrs = self.cagr_samples(table)?;
        if cagrs.is_empty() {
            return Err(ForecastError::DegenerateStatistics(format!(
                "no district has positive child_user in both {} and {}",
                self.years.base_year, self.years.last_year
            )));
        }

        let ratios = self.ratio_samples(table);
        if ratios.is_empty() {
            return Err(ForecastError::DegenerateStatistics(
                "no year-over-year child_user ratio could be computed".to_string(),
            ));
        }

        log_sample("child_user CAGR", &cagrs);
        log_sample("child_user year ratio", &ratios);

        let cagr_range =
            QuantileRange::from_samples(&cagrs, self.levels.cagr_lower, self.levels.cagr_upper)?;
        let ratio_range =
            QuantileRange::from_samples(&ratios, self.levels.ratio_lower, self.levels.ratio_upper)?;

        let bounds = GrowthBounds {
            min_cagr: cagr_range.lower,
            max_cagr: cagr_range.upper,
            min_year_ratio: ratio_range.lower,
            max_year_ratio: ratio_range.upper,
            cagr_samples: cagrs.len(),
            ratio_samples: ratios.len(),
        };

        tracing::info!(
            min_cagr = bounds.min_cagr,
            max_cagr = bounds.max_cagr,
            min_year_ratio = bounds.min_year_ratio,
            max_year_ratio = bounds.max_year_ratio,
            "estimated growth bounds"
        );

        Ok(bounds)
    }
}

fn log_sample(name: &str, samples: &[f64]) {
    tracing::debug!(
        sample = name,
        count = samples.len(),
        mean = samples.iter().mean(),
        std_dev = samples.iter().std_dev(),
        "growth sample summary"
    );
}
