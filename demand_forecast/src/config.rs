//! Projection configuration
//!
//! Every field has a default matching the reference deployment, so an empty
//! TOML document (or [`ProjectionConfig::default`]) projects 2023–2030 from
//! the 2015–2022 registry.
//!
//! ```toml
//! missing_anchor = "skip"
//!
//! [years]
//! base_year = 2015
//! last_year = 2022
//! future_start = 2023
//! future_end = 2030
//!
//! [bounds]
//! cagr_lower = 0.05
//! cagr_upper = 0.95
//! ratio_lower = 0.005
//! ratio_upper = 0.995
//! ```

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

/// Top-level configuration for one projection run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectionConfig {
    /// Observation window and forecast horizon
    pub years: ProjectionYears,
    /// Percentile levels used for the growth bounds
    pub bounds: BoundLevels,
    /// What to do with a district that has no row for the last observed year
    pub missing_anchor: MissingAnchorPolicy,
    /// Overrides the version tag stamped on every forecast row
    pub model_version: Option<String>,
}

/// Observation window `[base_year, last_year]` and horizon `[future_start, future_end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectionYears {
    pub base_year: i32,
    pub last_year: i32,
    pub future_start: i32,
    pub future_end: i32,
}

impl Default for ProjectionYears {
    fn default() -> Self {
        Self {
            base_year: 2015,
            last_year: 2022,
            future_start: 2023,
            future_end: 2030,
        }
    }
}

impl ProjectionYears {
    /// Years in the observation window
    pub fn observed(&self) -> RangeInclusive<i32> {
        self.base_year..=self.last_year
    }

    /// Years in the forecast horizon
    pub fn horizon(&self) -> RangeInclusive<i32> {
        self.future_start..=self.future_end
    }

    /// Number of compounding periods between base_year and last_year
    pub fn span(&self) -> u32 {
        (self.last_year - self.base_year).max(0) as u32
    }

    fn validate(&self) -> Result<()> {
        if self.base_year >= self.last_year {
            return Err(ForecastError::ConfigError(format!(
                "base_year ({}) must be earlier than last_year ({})",
                self.base_year, self.last_year
            )));
        }
        if self.future_start <= self.last_year {
            return Err(ForecastError::ConfigError(format!(
                "future_start ({}) must be after last_year ({})",
                self.future_start, self.last_year
            )));
        }
        if self.future_end < self.future_start {
            return Err(ForecastError::ConfigError(format!(
                "future_end ({}) must not precede future_start ({})",
                self.future_end, self.future_start
            )));
        }
        Ok(())
    }
}

/// Percentile levels, as fractions in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoundLevels {
    /// Level of the district CAGR distribution taken as `min_cagr`
    pub cagr_lower: f64,
    /// Level of the district CAGR distribution taken as `max_cagr`
    pub cagr_upper: f64,
    /// Level of the pooled year-over-year ratios taken as `min_year_ratio`
    pub ratio_lower: f64,
    /// Level of the pooled year-over-year ratios taken as `max_year_ratio`
    pub ratio_upper: f64,
}

impl Default for BoundLevels {
    fn default() -> Self {
        Self {
            cagr_lower: 0.05,
            cagr_upper: 0.95,
            ratio_lower: 0.005,
            ratio_upper: 0.995,
        }
    }
}

impl BoundLevels {
    fn validate(&self) -> Result<()> {
        for (name, lower, upper) in [
            ("cagr", self.cagr_lower, self.cagr_upper),
            ("ratio", self.ratio_lower, self.ratio_upper),
        ] {
            if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) {
                return Err(ForecastError::ConfigError(format!(
                    "{} percentile levels must lie in [0, 1]",
                    name
                )));
            }
            if lower > upper {
                return Err(ForecastError::ConfigError(format!(
                    "{}_lower ({}) exceeds {}_upper ({})",
                    name, lower, name, upper
                )));
            }
        }
        Ok(())
    }
}

/// Handling of districts without a last-year anchor row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingAnchorPolicy {
    /// Leave the district out of the forecast and report it as skipped
    #[default]
    Skip,
    /// Abort the whole run
    Fail,
}

impl ProjectionConfig {
    /// Load from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file on disk
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Check year ordering and percentile levels
    pub fn validate(&self) -> Result<()> {
        self.years.validate()?;
        self.bounds.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ProjectionConfig::from_toml_str("").unwrap();
        assert_eq!(config, ProjectionConfig::default());
        assert_eq!(config.years.span(), 7);
        assert_eq!(config.years.horizon().count(), 8);
    }

    #[test]
    fn test_partial_override() {
        let config = ProjectionConfig::from_toml_str(
            "missing_anchor = \"fail\"\n[years]\nfuture_end = 2026\n",
        )
        .unwrap();
        assert_eq!(config.missing_anchor, MissingAnchorPolicy::Fail);
        assert_eq!(config.years.future_end, 2026);
        assert_eq!(config.years.base_year, 2015);
    }

    #[test]
    fn test_rejects_overlapping_horizon() {
        let err = ProjectionConfig::from_toml_str("[years]\nfuture_start = 2022\n").unwrap_err();
        assert!(matches!(err, ForecastError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_inverted_levels() {
        let err = ProjectionConfig::from_toml_str("[bounds]\ncagr_lower = 0.9\ncagr_upper = 0.1\n")
            .unwrap_err();
        assert!(matches!(err, ForecastError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_unknown_field() {
        assert!(ProjectionConfig::from_toml_str("horizon = 5\n").is_err());
    }
}
