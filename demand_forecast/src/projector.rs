//! Forward projection of registry features
//!
//! Each feature grows from the district's last observed row at its own
//! clamped CAGR. Projection always compounds from that fixed anchor, never
//! from earlier projected years.

use crate::config::{MissingAnchorPolicy, ProjectionYears};
use crate::data::HistoricalTable;
use crate::error::{ForecastError, Result};
use crate::models::ModelSchema;
use crate::stats::GrowthBounds;
use growth_math::{compound, compound_annual_growth};
use std::collections::BTreeMap;

/// Projected feature values for one (district, year)
#[derive(Debug, Clone, PartialEq)]
pub struct FutureFeatureRow {
    pub district: String,
    pub year: i32,
    /// Projected base features
    pub features: BTreeMap<String, f64>,
    /// One-hot district columns, 1.0 for this row's district
    pub district_indicators: BTreeMap<String, f64>,
}

impl FutureFeatureRow {
    /// Value of a model column; `year` resolves to the row's year
    pub fn value(&self, column: &str) -> Option<f64> {
        if column == crate::data::YEAR_COLUMN {
            return Some(self.year as f64);
        }
        self.features
            .get(column)
            .or_else(|| self.district_indicators.get(column))
            .copied()
    }
}

/// Rows for every projected district plus the districts left out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedFeatures {
    pub rows: Vec<FutureFeatureRow>,
    pub skipped: Vec<String>,
}

/// Projects registry features over the forecast horizon
#[derive(Debug, Clone)]
pub struct FutureFeatureProjector {
    years: ProjectionYears,
    schema: ModelSchema,
}

impl FutureFeatureProjector {
    /// Create a projector for the model's feature set
    pub fn new(years: ProjectionYears, schema: &ModelSchema) -> Self {
        Self {
            years,
            schema: schema.clone(),
        }
    }

    /// Clamped growth rate of every projected feature for one district.
    ///
    /// A feature with no row at base_year or last_year keeps a rate of 0.0.
    /// A non-positive endpoint gives a raw rate of 0.0, which is then clamped
    /// like any other rate; a non-finite rate becomes 0.0.
    pub fn growth_rates(
        &self,
        table: &HistoricalTable,
        district: &str,
        bounds: &GrowthBounds,
    ) -> Result<BTreeMap<String, f64>> {
        let mut rates = BTreeMap::new();

        for feature in self.schema.projected_features() {
            let sums = table.yearly_sum(district, &feature, self.years.observed());
            let rate = match (
                sums.get(&self.years.base_year),
                sums.get(&self.years.last_year),
            ) {
                (Some(&start), Some(&end)) => {
                    let raw = compound_annual_growth(start, end, self.years.span())?;
                    if raw.is_finite() {
                        bounds.clamp_cagr(raw)
                    } else {
                        0.0
                    }
                }
                _ => 0.0,
            };
            rates.insert(feature, rate);
        }

        Ok(rates)
    }

    /// Rows for one district across the horizon.
    ///
    /// Fails with [`ForecastError::DataAvailability`] when the district has no
    /// row for last_year to anchor on.
    pub fn project_district(
        &self,
        table: &HistoricalTable,
        district: &str,
        bounds: &GrowthBounds,
    ) -> Result<Vec<FutureFeatureRow>> {
        let anchor = table.get(district, self.years.last_year).ok_or_else(|| {
            ForecastError::DataAvailability {
                district: district.to_string(),
                year: self.years.last_year,
            }
        })?;

        let rates = self.growth_rates(table, district, bounds)?;
        let indicators: BTreeMap<String, f64> = self
            .schema
            .district_columns
            .iter()
            .map(|column| {
                let hot = self.schema.district_of(column) == district;
                (column.clone(), if hot { 1.0 } else { 0.0 })
            })
            .collect();

        let rows = self
            .years
            .horizon()
            .map(|year| {
                let years_ahead = year - self.years.last_year;
                let features = rates
                    .iter()
                    .filter_map(|(feature, &rate)| {
                        anchor
                            .value(feature)
                            .map(|base| (feature.clone(), compound(base, rate, years_ahead)))
                    })
                    .collect();

                FutureFeatureRow {
                    district: district.to_string(),
                    year,
                    features,
                    district_indicators: indicators.clone(),
                }
            })
            .collect();

        Ok(rows)
    }

    /// Rows for every district in the table, ordered by district then year
    pub fn project_all(
        &self,
        table: &HistoricalTable,
        bounds: &GrowthBounds,
        policy: MissingAnchorPolicy,
    ) -> Result<ProjectedFeatures> {
        let mut districts: Vec<&String> = table.districts().iter().collect();
        districts.sort();

        let mut projected = ProjectedFeatures::default();
        for district in districts {
            match self.project_district(table, district, bounds) {
                Ok(rows) => projected.rows.extend(rows),
                Err(ForecastError::DataAvailability { district, year })
                    if policy == MissingAnchorPolicy::Skip =>
                {
                    tracing::warn!(%district, year, "no anchor row, district skipped");
                    projected.skipped.push(district);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(projected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::HistoricalRecord;
    use approx::assert_relative_eq;

    fn schema() -> ModelSchema {
        ModelSchema::new(
            vec!["year".to_string(), "population".to_string()],
            vec!["district_Gangnam".to_string(), "district_Mapo".to_string()],
        )
    }

    fn wide_bounds() -> GrowthBounds {
        GrowthBounds::new(-0.5, 0.5, 0.5, 2.0)
    }

    #[test]
    fn test_rate_follows_cagr_inside_bounds() {
        let table = HistoricalTable::new(vec![
            HistoricalRecord::new("Gangnam", 2015, 1.0).with_feature("population", 100.0),
            HistoricalRecord::new("Gangnam", 2022, 1.0).with_feature("population", 200.0),
        ])
        .unwrap();
        let projector = FutureFeatureProjector::new(ProjectionYears::default(), &schema());
        let rates = projector.growth_rates(&table, "Gangnam", &wide_bounds()).unwrap();
        assert_relative_eq!(rates["population"], 0.104_089_5, epsilon = 1e-6);
    }

    #[test]
    fn test_rate_is_clamped() {
        let table = HistoricalTable::new(vec![
            HistoricalRecord::new("Gangnam", 2015, 1.0).with_feature("population", 1.0),
            HistoricalRecord::new("Gangnam", 2022, 1.0).with_feature("population", 1000.0),
        ])
        .unwrap();
        let projector = FutureFeatureProjector::new(ProjectionYears::default(), &schema());
        let bounds = GrowthBounds::new(-0.02, 0.03, 0.9, 1.1);
        let rates = projector.growth_rates(&table, "Gangnam", &bounds).unwrap();
        assert_eq!(rates["population"], 0.03);
    }

    #[test]
    fn test_non_finite_rate_is_zero_not_clamped() {
        let table = HistoricalTable::new(vec![
            HistoricalRecord::new("Gangnam", 2015, 1.0).with_feature("population", 100.0),
            HistoricalRecord::new("Gangnam", 2022, 1.0).with_feature("population", f64::INFINITY),
        ])
        .unwrap();
        let projector = FutureFeatureProjector::new(ProjectionYears::default(), &schema());
        let bounds = GrowthBounds::new(0.01, 0.05, 0.9, 1.1);
        let rates = projector.growth_rates(&table, "Gangnam", &bounds).unwrap();
        assert_eq!(rates["population"], 0.0);
    }

    #[test]
    fn test_missing_anchor_is_data_availability() {
        let table =
            HistoricalTable::new(vec![HistoricalRecord::new("Mapo", 2015, 1.0)]).unwrap();
        let projector = FutureFeatureProjector::new(ProjectionYears::default(), &schema());
        assert!(matches!(
            projector.project_district(&table, "Mapo", &wide_bounds()),
            Err(ForecastError::DataAvailability { year: 2022, .. })
        ));
    }

    #[test]
    fn test_one_hot_indicators() {
        let table = HistoricalTable::new(vec![
            HistoricalRecord::new("Mapo", 2022, 1.0).with_feature("population", 10.0),
        ])
        .unwrap();
        let projector = FutureFeatureProjector::new(ProjectionYears::default(), &schema());
        let rows = projector.project_district(&table, "Mapo", &wide_bounds()).unwrap();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].value("district_Mapo"), Some(1.0));
        assert_eq!(rows[0].value("district_Gangnam"), Some(0.0));
        assert_eq!(rows[3].value("year"), Some(2026.0));
    }
}
