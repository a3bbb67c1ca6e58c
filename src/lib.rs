//! # Child Demand
//!
//! Umbrella crate for the district demand projection workspace.
//!
//! - [`growth_math`]: CAGR, quantile and compounding helpers
//! - [`demand_forecast`]: the projection pipeline, loaders, sinks and views
//!
//! ## Example
//!
//! ```
//! use child_demand_workspace::growth_math::compound_annual_growth;
//!
//! let rate = compound_annual_growth(100.0, 200.0, 7).unwrap();
//! assert!((rate - 0.1041).abs() < 1e-4);
//! ```

pub use demand_forecast;
pub use growth_math;

pub use demand_forecast::{
    ForecastError, ForecastRecord, GrowthBounds, HistoricalTable, ProjectionConfig,
    ProjectionPipeline, ProjectionReport,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_horizon() {
        let config = ProjectionConfig::default();
        assert_eq!(config.years.horizon().collect::<Vec<_>>().len(), 8);
        assert_eq!(config.years.last_year, 2022);
    }
}
