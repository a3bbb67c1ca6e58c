//! End-to-end projection run
//!
//! growth bounds → feature projection → model inference → capping → sorted
//! forecast table. Statistics and schema failures abort the run; a district
//! without an anchor row follows [`MissingAnchorPolicy`].
//!
//! [`MissingAnchorPolicy`]: crate::config::MissingAnchorPolicy

use crate::capping::SequentialCapper;
use crate::config::ProjectionConfig;
use crate::data::{HistoricalSource, HistoricalTable};
use crate::error::{ForecastError, Result};
use crate::export::{ForecastRecord, ForecastSink};
use crate::models::{PredictionModelAdapter, RawPrediction, RegressionModel};
use crate::projector::{FutureFeatureProjector, FutureFeatureRow};
use crate::stats::{GrowthBounds, HistoricalStatsEstimator};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Outcome of one projection run
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionReport {
    /// Bounds the run was capped with
    pub bounds: GrowthBounds,
    /// Forecast rows sorted by (district, year)
    pub records: Vec<ForecastRecord>,
    /// Districts left out for lack of an anchor row
    pub skipped_districts: Vec<String>,
}

/// Orchestrates a projection run over an injected model
#[derive(Debug)]
pub struct ProjectionPipeline<M: RegressionModel> {
    config: ProjectionConfig,
    model: M,
}

impl<M: RegressionModel> ProjectionPipeline<M> {
    /// Create a pipeline, validating the configuration
    pub fn new(config: ProjectionConfig, model: M) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, model })
    }

    /// The run configuration
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// The injected model
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Version tag written to every forecast row
    pub fn model_version(&self) -> &str {
        self.config
            .model_version
            .as_deref()
            .unwrap_or_else(|| self.model.version())
    }

    /// Run with the current time as the creation timestamp
    pub fn run(&self, table: &HistoricalTable) -> Result<ProjectionReport> {
        self.run_at(table, Utc::now())
    }

    /// Run with an explicit creation timestamp
    pub fn run_at(
        &self,
        table: &HistoricalTable,
        created_at: DateTime<Utc>,
    ) -> Result<ProjectionReport> {
        let years = self.config.years;
        tracing::info!(
            districts = table.districts().len(),
            base_year = years.base_year,
            last_year = years.last_year,
            future_start = years.future_start,
            future_end = years.future_end,
            "starting projection run"
        );

        let bounds = HistoricalStatsEstimator::new(&self.config).estimate(table)?;

        let projector = FutureFeatureProjector::new(years, self.model.schema());
        let projected = projector.project_all(table, &bounds, self.config.missing_anchor)?;

        let predictions = PredictionModelAdapter::new(&self.model).predict(&projected.rows)?;

        let mut by_district: BTreeMap<&str, Vec<(&FutureFeatureRow, &RawPrediction)>> =
            BTreeMap::new();
        for (row, prediction) in projected.rows.iter().zip(&predictions) {
            by_district
                .entry(row.district.as_str())
                .or_default()
                .push((row, prediction));
        }

        let capper = SequentialCapper::new(bounds);
        let model_version = self.model_version().to_string();
        let mut records = Vec::with_capacity(predictions.len());

        for (district, mut entries) in by_district {
            entries.sort_by_key(|(row, _)| row.year);

            let last_observed = table
                .get(district, years.last_year)
                .map(|r| r.child_user)
                .ok_or_else(|| ForecastError::DataAvailability {
                    district: district.to_string(),
                    year: years.last_year,
                })?;

            let raw: Vec<RawPrediction> = entries.iter().map(|(_, p)| (*p).clone()).collect();
            let capped = capper.cap_district(last_observed, &raw)?;

            for ((row, _), capped) in entries.iter().zip(capped) {
                if capped.capped != capped.raw {
                    tracing::debug!(
                        district,
                        year = capped.year,
                        raw = capped.raw,
                        capped = capped.capped,
                        "prediction capped"
                    );
                }
                records.push(ForecastRecord {
                    district: district.to_string(),
                    year: capped.year,
                    predicted_child_user: capped.capped,
                    features: row.features.clone(),
                    model_version: model_version.clone(),
                    created_at,
                });
            }
        }

        tracing::info!(
            rows = records.len(),
            skipped = projected.skipped.len(),
            "projection run finished"
        );

        Ok(ProjectionReport {
            bounds,
            records,
            skipped_districts: projected.skipped,
        })
    }

    /// Read from `source`, run, and write the forecast table to `sink`
    pub fn run_into<S, K>(&self, source: &S, sink: &mut K) -> Result<ProjectionReport>
    where
        S: HistoricalSource + ?Sized,
        K: ForecastSink + ?Sized,
    {
        let table = source.load()?;
        let report = self.run(&table)?;
        sink.write_forecasts(&report.records)?;
        Ok(report)
    }
}
