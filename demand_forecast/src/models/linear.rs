//! Linear model artifact
//!
//! A JSON document carrying the schema, an intercept and one coefficient per
//! feature column:
//!
//! ```json
//! {
//!   "version": "linear-2024.1",
//!   "base_features": ["year", "population"],
//!   "district_columns": ["district_Mapo"],
//!   "intercept": 1.5,
//!   "coefficients": {"year": 0.0, "population": 0.0001, "district_Mapo": 0.2}
//! }
//! ```

use crate::error::{ForecastError, Result};
use crate::models::{FeatureMatrix, ModelSchema, RegressionModel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Linear regression on `log1p(child_user)` loaded from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    /// Version tag stamped on forecasts
    pub version: String,
    /// Column schema
    #[serde(flatten)]
    pub schema: ModelSchema,
    /// Constant term
    pub intercept: f64,
    /// Weight per feature column
    pub coefficients: BTreeMap<String, f64>,
    #[serde(skip)]
    weights: Vec<f64>,
}

impl LinearModelArtifact {
    /// Create an artifact and validate it against its schema
    pub fn new(
        version: impl Into<String>,
        schema: ModelSchema,
        intercept: f64,
        coefficients: BTreeMap<String, f64>,
    ) -> Result<Self> {
        let mut artifact = Self {
            version: version.into(),
            schema,
            intercept,
            coefficients,
            weights: Vec::new(),
        };
        artifact.prepare()?;
        Ok(artifact)
    }

    /// Load from a JSON string
    pub fn from_json_str(s: &str) -> Result<Self> {
        let mut artifact: Self = serde_json::from_str(s)?;
        artifact.prepare()?;
        Ok(artifact)
    }

    /// Load from a JSON file on disk
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Validate the schema and resolve coefficients into column order
    fn prepare(&mut self) -> Result<()> {
        let columns = self.schema.feature_columns();
        if columns.is_empty() {
            return Err(ForecastError::ModelError(
                "model declares no feature columns".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(ForecastError::ModelError(format!(
                    "column '{}' declared more than once",
                    column
                )));
            }
        }

        self.weights = columns
            .iter()
            .map(|column| {
                self.coefficients.get(column).copied().ok_or_else(|| {
                    ForecastError::ModelError(format!("no coefficient for column '{}'", column))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(())
    }
}

impl RegressionModel for LinearModelArtifact {
    fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>> {
        if matrix.columns() != self.schema.feature_columns().as_slice() {
            return Err(ForecastError::SchemaMismatch(format!(
                "matrix columns {:?} do not match model columns",
                matrix.columns()
            )));
        }

        Ok(matrix
            .rows()
            .iter()
            .map(|row| {
                self.intercept
                    + row
                        .iter()
                        .zip(&self.weights)
                        .map(|(value, weight)| value * weight)
                        .sum::<f64>()
            })
            .collect())
    }
}
