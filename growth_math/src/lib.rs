//! # Growth Math
//!
//! Numeric building blocks for projecting district-level series forward.
//! This crate provides compound annual growth rates, linear-interpolated
//! quantiles, clamping and compounding helpers used by the projection
//! pipeline.

use thiserror::Error;

pub mod growth;
pub mod quantile;

pub use growth::{clamp_rate, compound, compound_annual_growth, year_over_year_ratios};
pub use quantile::{quantile, QuantileRange};

/// Errors that can occur in growth and quantile calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for growth math operations
pub type Result<T> = std::result::Result<T, MathError>;
