//! Forecast records and the sinks they are written to

use crate::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One projected (district, year) row of the forecast table
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRecord {
    pub district: String,
    pub year: i32,
    /// Capped prediction
    pub predicted_child_user: f64,
    /// Projected features the prediction was made from
    pub features: BTreeMap<String, f64>,
    pub model_version: String,
    pub created_at: DateTime<Utc>,
}

/// Destination of a run's forecast table
pub trait ForecastSink {
    /// Write the full forecast table
    fn write_forecasts(&mut self, records: &[ForecastRecord]) -> Result<()>;
}

/// Keeps written records in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Vec<ForecastRecord>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Records from the last write
    pub fn records(&self) -> &[ForecastRecord] {
        &self.records
    }
}

impl ForecastSink for MemorySink {
    fn write_forecasts(&mut self, records: &[ForecastRecord]) -> Result<()> {
        self.records = records.to_vec();
        Ok(())
    }
}

/// Writes the forecast table as a flat CSV file.
///
/// Columns: `district, year, predicted_child_user`, the feature columns in
/// name order, then `model_version, created_at` (RFC 3339).
#[derive(Debug, Clone)]
pub struct CsvForecastSink {
    path: PathBuf,
    byte_order_mark: bool,
}

impl CsvForecastSink {
    /// Create a sink writing to `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            byte_order_mark: false,
        }
    }

    /// Prefix the file with a UTF-8 byte order mark so spreadsheet tools
    /// detect the encoding of Korean district names
    pub fn with_byte_order_mark(mut self, enabled: bool) -> Self {
        self.byte_order_mark = enabled;
        self
    }

    /// Path of the CSV file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ForecastSink for CsvForecastSink {
    fn write_forecasts(&mut self, records: &[ForecastRecord]) -> Result<()> {
        let mut file = File::create(&self.path)?;
        if self.byte_order_mark {
            file.write_all("\u{feff}".as_bytes())?;
        }

        let features: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.features.keys().map(String::as_str))
            .collect();

        let mut writer = csv::Writer::from_writer(file);

        let mut header = vec!["district", "year", "predicted_child_user"];
        header.extend(features.iter().copied());
        header.extend(["model_version", "created_at"]);
        writer.write_record(&header)?;

        for record in records {
            let mut row = vec![
                record.district.clone(),
                record.year.to_string(),
                record.predicted_child_user.to_string(),
            ];
            row.extend(features.iter().map(|feature| {
                record
                    .features
                    .get(*feature)
                    .map(|v| v.to_string())
                    .unwrap_or_default()
            }));
            row.push(record.model_version.clone());
            row.push(record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true));
            writer.write_record(&row)?;
        }

        writer.flush()?;
        tracing::info!(path = %self.path.display(), rows = records.len(), "wrote forecast table");
        Ok(())
    }
}
