//! Pre-trained regression models and the adapter that feeds them
//!
//! Models are trained on `log1p(child_user)`. The adapter assembles the
//! feature matrix in the model's declared column order and maps outputs back
//! to natural units with `expm1`.

use crate::data::{DISTRICT_COLUMN, YEAR_COLUMN};
use crate::error::{ForecastError, Result};
use crate::projector::FutureFeatureRow;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod linear;

pub use linear::LinearModelArtifact;

/// Prefix of one-hot district columns unless the artifact declares another
pub const DEFAULT_DISTRICT_PREFIX: &str = "district_";

fn default_district_prefix() -> String {
    DEFAULT_DISTRICT_PREFIX.to_string()
}

/// Column schema baked into a trained model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    /// Ordered numeric feature columns
    pub base_features: Vec<String>,
    /// Ordered one-hot district columns
    pub district_columns: Vec<String>,
    /// Prefix stripped from a district column to recover the district name
    #[serde(default = "default_district_prefix")]
    pub district_prefix: String,
}

impl ModelSchema {
    /// Create a schema using the default district prefix
    pub fn new(base_features: Vec<String>, district_columns: Vec<String>) -> Self {
        Self {
            base_features,
            district_columns,
            district_prefix: default_district_prefix(),
        }
    }

    /// Full column order expected by the model
    pub fn feature_columns(&self) -> Vec<String> {
        self.base_features
            .iter()
            .chain(self.district_columns.iter())
            .cloned()
            .collect()
    }

    /// Base features that are projected forward (identifier columns excluded)
    pub fn projected_features(&self) -> Vec<String> {
        self.base_features
            .iter()
            .filter(|c| c.as_str() != YEAR_COLUMN && c.as_str() != DISTRICT_COLUMN)
            .cloned()
            .collect()
    }

    /// District name encoded by a one-hot column
    pub fn district_of<'a>(&self, column: &'a str) -> &'a str {
        column
            .strip_prefix(self.district_prefix.as_str())
            .unwrap_or(column)
    }

    /// One-hot column name for a district
    pub fn column_for(&self, district: &str) -> String {
        format!("{}{}", self.district_prefix, district)
    }
}

/// Dense row-major feature matrix in a fixed column order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Assemble the matrix for `rows` in the schema's column order.
    ///
    /// `year` resolves to the row's year; any other column the row cannot
    /// supply is a [`ForecastError::SchemaMismatch`].
    pub fn assemble(rows: &[FutureFeatureRow], schema: &ModelSchema) -> Result<Self> {
        let columns = schema.feature_columns();
        let mut matrix = Vec::with_capacity(rows.len());

        for row in rows {
            let values = columns
                .iter()
                .map(|column| {
                    row.value(column).ok_or_else(|| {
                        ForecastError::SchemaMismatch(format!(
                            "column '{}' missing for district '{}' in {}",
                            column, row.district, row.year
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            matrix.push(values);
        }

        Ok(Self {
            columns,
            rows: matrix,
        })
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows of values
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }
}

/// A trained regression model producing `log1p(child_user)`
pub trait RegressionModel: Debug {
    /// Column schema the model was trained on
    fn schema(&self) -> &ModelSchema;

    /// Version tag stamped on forecast rows
    fn version(&self) -> &str;

    /// Predict one log-scale value per matrix row
    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>>;
}

/// Model output for one (district, year), back in natural units
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub district: String,
    pub year: i32,
    pub child_user_raw: f64,
}

/// Runs a [`RegressionModel`] over projected feature rows
#[derive(Debug)]
pub struct PredictionModelAdapter<'a, M: RegressionModel + ?Sized> {
    model: &'a M,
}

impl<'a, M: RegressionModel + ?Sized> PredictionModelAdapter<'a, M> {
    /// Wrap a model
    pub fn new(model: &'a M) -> Self {
        Self { model }
    }

    /// Predict every row in one batched call
    pub fn predict(&self, rows: &[FutureFeatureRow]) -> Result<Vec<RawPrediction>> {
        let matrix = FeatureMatrix::assemble(rows, self.model.schema())?;
        let outputs = self.model.predict(&matrix)?;

        if outputs.len() != rows.len() {
            return Err(ForecastError::SchemaMismatch(format!(
                "model returned {} predictions for {} rows",
                outputs.len(),
                rows.len()
            )));
        }

        Ok(rows
            .iter()
            .zip(outputs)
            .map(|(row, output)| RawPrediction {
                district: row.district.clone(),
                year: row.year,
                child_user_raw: output.exp_m1(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row(district: &str, year: i32) -> FutureFeatureRow {
        let mut features = BTreeMap::new();
        features.insert("population".to_string(), 1000.0);
        let mut indicators = BTreeMap::new();
        indicators.insert("district_Mapo".to_string(), 1.0);
        indicators.insert("district_Jongno".to_string(), 0.0);
        FutureFeatureRow {
            district: district.to_string(),
            year,
            features,
            district_indicators: indicators,
        }
    }

    #[derive(Debug)]
    struct EchoYear {
        schema: ModelSchema,
    }

    impl RegressionModel for EchoYear {
        fn schema(&self) -> &ModelSchema {
            &self.schema
        }

        fn version(&self) -> &str {
            "echo"
        }

        fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>> {
            Ok(matrix.rows().iter().map(|r| (r[0] - 2020.0).ln_1p()).collect())
        }
    }

    fn schema() -> ModelSchema {
        ModelSchema::new(
            vec!["year".to_string(), "population".to_string()],
            vec!["district_Jongno".to_string(), "district_Mapo".to_string()],
        )
    }

    #[test]
    fn test_matrix_follows_schema_order() {
        let matrix = FeatureMatrix::assemble(&[row("Mapo", 2024)], &schema()).unwrap();
        assert_eq!(matrix.n_cols(), 4);
        assert_eq!(matrix.rows()[0], vec![2024.0, 1000.0, 0.0, 1.0]);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let mut s = schema();
        s.base_features.push("grdp".to_string());
        assert!(matches!(
            FeatureMatrix::assemble(&[row("Mapo", 2024)], &s),
            Err(ForecastError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_adapter_inverts_log1p() {
        let model = EchoYear { schema: schema() };
        let predictions = PredictionModelAdapter::new(&model)
            .predict(&[row("Mapo", 2023), row("Mapo", 2025)])
            .unwrap();
        assert!((predictions[0].child_user_raw - 3.0).abs() < 1e-9);
        assert!((predictions[1].child_user_raw - 5.0).abs() < 1e-9);
        assert_eq!(predictions[1].year, 2025);
    }

    #[test]
    fn test_district_column_names() {
        let s = schema();
        assert_eq!(s.district_of("district_Mapo"), "Mapo");
        assert_eq!(s.column_for("Jongno"), "district_Jongno");
        assert_eq!(s.projected_features(), vec!["population".to_string()]);
    }
}
