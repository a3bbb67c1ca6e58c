//! Error types for the demand_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A district has no historical row for a year the projection anchors on
    #[error("No historical data for district '{district}' in {year}")]
    DataAvailability { district: String, year: i32 },

    /// Growth bounds could not be estimated from the historical sample
    #[error("Degenerate statistics: {0}")]
    DegenerateStatistics(String),

    /// Assembled features do not match the model's declared columns
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Invalid projection configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid or unusable model artifact
    #[error("Model error: {0}")]
    ModelError(String),

    /// Error from growth and quantile calculations
    #[error("Math error: {0}")]
    MathError(#[from] growth_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error writing the forecast table
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error decoding a model artifact
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error decoding a configuration file
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
