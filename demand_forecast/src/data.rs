//! Historical registry data handling
//!
//! The historical table holds one row per (district, year) with the observed
//! `child_user` count and every numeric registry column as a named feature.

use crate::error::{ForecastError, Result};
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Column holding the district name
pub const DISTRICT_COLUMN: &str = "district";
/// Column holding the observation year
pub const YEAR_COLUMN: &str = "year";
/// Column holding the observed child-centre user count
pub const CHILD_USER_COLUMN: &str = "child_user";

/// One observed (district, year) row of the registry
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRecord {
    /// District name
    pub district: String,
    /// Observation year
    pub year: i32,
    /// Named numeric columns; missing cells are NaN
    pub features: BTreeMap<String, f64>,
    /// Observed child-centre users
    pub child_user: f64,
}

impl HistoricalRecord {
    /// Create a record with no feature columns
    pub fn new(district: impl Into<String>, year: i32, child_user: f64) -> Self {
        Self {
            district: district.into(),
            year,
            features: BTreeMap::new(),
            child_user,
        }
    }

    /// Add a feature column
    pub fn with_feature(mut self, name: impl Into<String>, value: f64) -> Self {
        self.features.insert(name.into(), value);
        self
    }

    /// Value of a numeric column, `child_user` included
    pub fn value(&self, column: &str) -> Option<f64> {
        if column == CHILD_USER_COLUMN {
            Some(self.child_user)
        } else {
            self.features.get(column).copied()
        }
    }
}

/// Validated set of historical records, unique per (district, year)
#[derive(Debug, Clone, Default)]
pub struct HistoricalTable {
    records: Vec<HistoricalRecord>,
    index: HashMap<(String, i32), usize>,
    districts: Vec<String>,
}

impl HistoricalTable {
    /// Build a table, rejecting blank district names and duplicate keys
    pub fn new(records: Vec<HistoricalRecord>) -> Result<Self> {
        let mut index = HashMap::with_capacity(records.len());
        let mut districts: Vec<String> = Vec::new();

        for (position, record) in records.iter().enumerate() {
            if record.district.trim().is_empty() {
                return Err(ForecastError::DataError(format!(
                    "Row {} has a blank district name",
                    position
                )));
            }

            let key = (record.district.clone(), record.year);
            if index.insert(key, position).is_some() {
                return Err(ForecastError::DataError(format!(
                    "Duplicate row for district '{}' in {}",
                    record.district, record.year
                )));
            }

            if !districts.contains(&record.district) {
                districts.push(record.district.clone());
            }
        }

        Ok(Self {
            records,
            index,
            districts,
        })
    }

    /// All records in load order
    pub fn records(&self) -> &[HistoricalRecord] {
        &self.records
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Distinct districts in first-seen order
    pub fn districts(&self) -> &[String] {
        &self.districts
    }

    /// Look up the record for a district and year
    pub fn get(&self, district: &str, year: i32) -> Option<&HistoricalRecord> {
        self.index
            .get(&(district.to_string(), year))
            .map(|&position| &self.records[position])
    }

    /// A district's records ordered by year
    pub fn district_records(&self, district: &str) -> Vec<&HistoricalRecord> {
        let mut rows: Vec<&HistoricalRecord> = self
            .records
            .iter()
            .filter(|r| r.district == district)
            .collect();
        rows.sort_by_key(|r| r.year);
        rows
    }

    /// A district's `child_user` values ordered by year
    pub fn child_user_series(&self, district: &str) -> Vec<f64> {
        self.district_records(district)
            .into_iter()
            .map(|r| r.child_user)
            .collect()
    }

    /// Per-year sum of one column for a district within `years`.
    ///
    /// NaN and absent cells contribute nothing, so a year that has a row but
    /// no usable value sums to `0.0`.
    pub fn yearly_sum(
        &self,
        district: &str,
        column: &str,
        years: RangeInclusive<i32>,
    ) -> BTreeMap<i32, f64> {
        let mut sums = BTreeMap::new();
        for record in self
            .records
            .iter()
            .filter(|r| r.district == district && years.contains(&r.year))
        {
            let value = record.value(column).filter(|v| !v.is_nan()).unwrap_or(0.0);
            *sums.entry(record.year).or_insert(0.0) += value;
        }
        sums
    }

    /// Earliest and latest observed years
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some((min, max))
    }
}

/// A source the historical table can be read from
pub trait HistoricalSource {
    /// Read the full historical table
    fn load(&self) -> Result<HistoricalTable>;
}

impl HistoricalSource for HistoricalTable {
    fn load(&self) -> Result<HistoricalTable> {
        Ok(self.clone())
    }
}

/// Historical table stored as a CSV file with a header row
#[derive(Debug, Clone)]
pub struct CsvHistoricalSource {
    path: PathBuf,
}

impl CsvHistoricalSource {
    /// Create a source reading from `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the CSV file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoricalSource for CsvHistoricalSource {
    fn load(&self) -> Result<HistoricalTable> {
        let file = File::open(&self.path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        let table = table_from_dataframe(&df)?;
        tracing::debug!(
            path = %self.path.display(),
            rows = table.len(),
            districts = table.districts().len(),
            "loaded historical table"
        );
        Ok(table)
    }
}

/// Convert a registry DataFrame into a [`HistoricalTable`].
///
/// `district`, `year` and `child_user` are required; every other numeric
/// column becomes a feature.
pub fn table_from_dataframe(df: &DataFrame) -> Result<HistoricalTable> {
    let district_name = find_column(df, DISTRICT_COLUMN)?;
    let year_name = find_column(df, YEAR_COLUMN)?;
    let child_user_name = find_column(df, CHILD_USER_COLUMN)?;

    let districts = df.column(&district_name)?.cast(&DataType::Utf8)?;
    let districts = districts.utf8()?;
    let years = df.column(&year_name)?.cast(&DataType::Int64)?;
    let years = years.i64()?;
    let child_users = column_as_f64(df, &child_user_name)?;

    let mut feature_columns = Vec::new();
    for series in df.get_columns() {
        let name = series.name();
        if name == district_name || name == year_name || name == child_user_name {
            continue;
        }
        if series.dtype().is_numeric() {
            feature_columns.push((normalize_name(name), column_as_f64(df, name)?));
        }
    }

    let mut records = Vec::with_capacity(df.height());
    for (row, (district, year)) in districts.into_iter().zip(years.into_iter()).enumerate() {
        let district = district
            .ok_or_else(|| ForecastError::DataError(format!("Row {} has no district", row)))?;
        let year = year
            .ok_or_else(|| ForecastError::DataError(format!("Row {} has no year", row)))?;
        let year = i32::try_from(year)
            .map_err(|_| ForecastError::DataError(format!("Row {} has year {} out of range", row, year)))?;

        let mut record = HistoricalRecord::new(district.trim(), year, child_users[row]);
        for (name, values) in &feature_columns {
            record.features.insert(name.clone(), values[row]);
        }
        records.push(record);
    }

    HistoricalTable::new(records)
}

/// Helper to resolve a column by name, tolerating a UTF-8 byte order mark and
/// surrounding whitespace in the header
fn find_column(df: &DataFrame, wanted: &str) -> Result<String> {
    df.get_column_names()
        .into_iter()
        .find(|name| normalize_name(name) == wanted)
        .map(|name| name.to_string())
        .ok_or_else(|| ForecastError::DataError(format!("Column '{}' not found", wanted)))
}

fn normalize_name(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_string()
}

/// Helper to get a column as f64 values with nulls mapped to NaN
fn column_as_f64(df: &DataFrame, column_name: &str) -> Result<Vec<f64>> {
    let col = df.column(column_name).map_err(|e| {
        ForecastError::DataError(format!("Column '{}' not found: {}", column_name, e))
    })?;

    if !col.dtype().is_numeric() {
        return Err(ForecastError::DataError(format!(
            "Column '{}' cannot be converted to f64",
            column_name
        )));
    }

    let values = col.cast(&DataType::Float64)?;
    Ok(values
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<HistoricalRecord> {
        vec![
            HistoricalRecord::new("Mapo", 2016, 120.0).with_feature("population", 10.0),
            HistoricalRecord::new("Mapo", 2015, 100.0).with_feature("population", f64::NAN),
            HistoricalRecord::new("Gangnam", 2015, 90.0).with_feature("population", 20.0),
        ]
    }

    #[test]
    fn test_table_lookup_and_order() {
        let table = HistoricalTable::new(sample_records()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.districts(), &["Mapo".to_string(), "Gangnam".to_string()]);
        assert_eq!(table.get("Mapo", 2015).unwrap().child_user, 100.0);
        assert!(table.get("Mapo", 2020).is_none());
        assert_eq!(table.child_user_series("Mapo"), vec![100.0, 120.0]);
        assert_eq!(table.year_range(), Some((2015, 2016)));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut records = sample_records();
        records.push(HistoricalRecord::new("Mapo", 2015, 1.0));
        assert!(matches!(
            HistoricalTable::new(records),
            Err(ForecastError::DataError(_))
        ));
    }

    #[test]
    fn test_yearly_sum_skips_nan() {
        let table = HistoricalTable::new(sample_records()).unwrap();
        let sums = table.yearly_sum("Mapo", "population", 2015..=2016);
        assert_eq!(sums.get(&2015), Some(&0.0));
        assert_eq!(sums.get(&2016), Some(&10.0));

        let users = table.yearly_sum("Mapo", CHILD_USER_COLUMN, 2016..=2016);
        assert_eq!(users.len(), 1);
        assert_eq!(users.get(&2016), Some(&120.0));
    }
}
