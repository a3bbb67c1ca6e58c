//! # Demand Forecast
//!
//! District-level projection of child-centre demand for Seoul.
//!
//! ## Features
//!
//! - Historical registry loading (CSV via polars)
//! - Empirical growth bounds from 2015–2022 `child_user` series
//! - Forward feature projection with clamped compound growth
//! - Inference through a pre-trained `log1p(child_user)` regression model
//! - Sequential year-over-year capping of raw predictions
//! - Flat CSV export and dashboard summaries over the results
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use demand_forecast::data::CsvHistoricalSource;
//! use demand_forecast::export::CsvForecastSink;
//! use demand_forecast::models::LinearModelArtifact;
//! use demand_forecast::{ProjectionConfig, ProjectionPipeline};
//!
//! let config = ProjectionConfig::from_toml_file("projection.toml")?;
//! let model = LinearModelArtifact::from_json_file("model.json")?;
//! let pipeline = ProjectionPipeline::new(config, model)?;
//!
//! let source = CsvHistoricalSource::new("master_2015_2022.csv");
//! let mut sink = CsvForecastSink::new("predicted_child_user_2023_2030.csv");
//! let report = pipeline.run_into(&source, &mut sink)?;
//! println!("{} rows, {} districts skipped", report.records.len(), report.skipped_districts.len());
//! ```

pub mod capping;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod projector;
pub mod stats;
pub mod views;

// Re-export commonly used types
pub use crate::config::{MissingAnchorPolicy, ProjectionConfig, ProjectionYears};
pub use crate::data::{HistoricalRecord, HistoricalSource, HistoricalTable};
pub use crate::error::{ForecastError, Result};
pub use crate::export::{ForecastRecord, ForecastSink};
pub use crate::models::{ModelSchema, RegressionModel};
pub use crate::pipeline::{ProjectionPipeline, ProjectionReport};
pub use crate::stats::GrowthBounds;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
