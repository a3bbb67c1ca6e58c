//! Dashboard views over observed and forecast tables
//!
//! Observed years come from the historical table, later years from the
//! forecast records. Selecting all districts sums across them.

use crate::data::HistoricalTable;
use crate::export::ForecastRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Features shown alongside a single district's summary
pub const SNAPSHOT_FEATURES: [&str; 6] = [
    "single_parent",
    "basic_beneficiaries",
    "multicultural_hh",
    "academy_cnt",
    "grdp",
    "population",
];

/// Label the dashboard uses for "all districts"
pub const ALL_DISTRICTS_LABEL: &str = "전체";

/// Which districts a view covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistrictSelection {
    All,
    District(String),
}

impl DistrictSelection {
    /// Parse a dashboard selection; blank, `전체` and `all` select every district
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == ALL_DISTRICTS_LABEL || s.eq_ignore_ascii_case("all") {
            DistrictSelection::All
        } else {
            DistrictSelection::District(s.to_string())
        }
    }

    fn matches(&self, district: &str) -> bool {
        match self {
            DistrictSelection::All => true,
            DistrictSelection::District(name) => name == district,
        }
    }
}

/// One point of a district's child_user chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub child_user: f64,
    pub is_predicted: bool,
}

/// Per-year totals of the observed dashboard table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardItem {
    pub year: i32,
    /// Observed users, NaN cells contributing nothing
    pub child_user: f64,
    /// Observed child facilities, 0 when the column is absent
    pub child_facility: f64,
}

/// Summary card for one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub selection: DistrictSelection,
    pub year: i32,
    /// Observed or forecast users, 0 when no row exists
    pub child_user: f64,
    /// Observed child facilities; forecasts carry none
    pub child_facility: Option<f64>,
    pub previous_child_user: Option<f64>,
    /// Per-district average over the districts with a usable value that year
    pub seoul_average: Option<f64>,
    pub district_count: usize,
    /// Feature snapshot, single-district selections only
    pub features: Option<BTreeMap<String, f64>>,
}

/// Read-only view combining history and forecasts
#[derive(Debug, Clone, Copy)]
pub struct DashboardView<'a> {
    history: &'a HistoricalTable,
    forecasts: &'a [ForecastRecord],
}

impl<'a> DashboardView<'a> {
    /// Create a view
    pub fn new(history: &'a HistoricalTable, forecasts: &'a [ForecastRecord]) -> Self {
        Self { history, forecasts }
    }

    /// Distinct non-blank district names in first-seen order
    pub fn districts(&self) -> Vec<&'a str> {
        self.history
            .districts()
            .iter()
            .map(String::as_str)
            .filter(|d| !d.trim().is_empty())
            .collect()
    }

    fn last_observed_year(&self) -> Option<i32> {
        self.history.year_range().map(|(_, last)| last)
    }

    fn is_observed(&self, year: i32) -> bool {
        self.last_observed_year().is_some_and(|last| year <= last)
    }

    /// Observed points followed by forecast points, each ordered by year
    pub fn series(&self, selection: &DistrictSelection) -> Vec<SeriesPoint> {
        let mut actual: BTreeMap<i32, f64> = BTreeMap::new();
        for record in self
            .history
            .records()
            .iter()
            .filter(|r| selection.matches(&r.district) && !r.child_user.is_nan())
        {
            *actual.entry(record.year).or_insert(0.0) += record.child_user;
        }

        let mut predicted: BTreeMap<i32, f64> = BTreeMap::new();
        for record in self
            .forecasts
            .iter()
            .filter(|r| selection.matches(&r.district) && !r.predicted_child_user.is_nan())
        {
            *predicted.entry(record.year).or_insert(0.0) += record.predicted_child_user;
        }

        actual
            .into_iter()
            .map(|(year, child_user)| SeriesPoint {
                year,
                child_user,
                is_predicted: false,
            })
            .chain(predicted.into_iter().map(|(year, child_user)| SeriesPoint {
                year,
                child_user,
                is_predicted: true,
            }))
            .collect()
    }

    /// Observed per-year totals for the selection within an optional year range.
    ///
    /// Only years with at least one matching row appear, in ascending order.
    pub fn range(
        &self,
        selection: &DistrictSelection,
        start_year: Option<i32>,
        end_year: Option<i32>,
    ) -> Vec<DashboardItem> {
        let mut items: BTreeMap<i32, DashboardItem> = BTreeMap::new();
        for record in self
            .history
            .records()
            .iter()
            .filter(|r| selection.matches(&r.district) && in_range(r.year, start_year, end_year))
        {
            let item = items.entry(record.year).or_insert(DashboardItem {
                year: record.year,
                child_user: 0.0,
                child_facility: 0.0,
            });
            if !record.child_user.is_nan() {
                item.child_user += record.child_user;
            }
            if let Some(facilities) = record.value("child_facility").filter(|v| !v.is_nan()) {
                item.child_facility += facilities;
            }
        }
        items.into_values().collect()
    }

    /// Forecast per-year totals for the selection within an optional year range
    pub fn forecast_range(
        &self,
        selection: &DistrictSelection,
        start_year: Option<i32>,
        end_year: Option<i32>,
    ) -> Vec<SeriesPoint> {
        let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
        for record in self
            .forecasts
            .iter()
            .filter(|r| selection.matches(&r.district) && in_range(r.year, start_year, end_year))
        {
            let total = totals.entry(record.year).or_insert(0.0);
            if !record.predicted_child_user.is_nan() {
                *total += record.predicted_child_user;
            }
        }
        totals
            .into_iter()
            .map(|(year, child_user)| SeriesPoint {
                year,
                child_user,
                is_predicted: true,
            })
            .collect()
    }

    /// Summary card for `year`
    pub fn year_summary(&self, year: i32, selection: &DistrictSelection) -> YearSummary {
        let observed = self.is_observed(year);
        let child_user = self.child_user_total(year, selection).unwrap_or(0.0);

        let child_facility = if observed {
            Some(
                self.history
                    .records()
                    .iter()
                    .filter(|r| r.year == year && selection.matches(&r.district))
                    .filter_map(|r| r.value("child_facility"))
                    .filter(|v| !v.is_nan())
                    .sum::<f64>(),
            )
        } else {
            None
        };

        let first_observed = self.history.year_range().map(|(first, _)| first);
        let previous_child_user = match first_observed {
            Some(first) if year - 1 >= first => self.child_user_total(year - 1, selection),
            _ => None,
        };

        let (total, district_count) = self.all_district_total(year);
        let seoul_average = (district_count > 0).then(|| total / district_count as f64);

        let features = match selection {
            DistrictSelection::All => None,
            DistrictSelection::District(name) => self.snapshot(year, name),
        };

        YearSummary {
            selection: selection.clone(),
            year,
            child_user,
            child_facility,
            previous_child_user,
            seoul_average,
            district_count,
            features,
        }
    }

    /// Sum of child_user for the selection in `year`, from whichever table covers it
    fn child_user_total(&self, year: i32, selection: &DistrictSelection) -> Option<f64> {
        let values: Vec<f64> = if self.is_observed(year) {
            self.history
                .records()
                .iter()
                .filter(|r| r.year == year && selection.matches(&r.district))
                .map(|r| r.child_user)
                .collect()
        } else {
            self.forecasts
                .iter()
                .filter(|r| r.year == year && selection.matches(&r.district))
                .map(|r| r.predicted_child_user)
                .collect()
        };

        let values: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        (!values.is_empty()).then(|| values.iter().sum::<f64>())
    }

    /// Total users in `year` and the number of districts contributing a value
    fn all_district_total(&self, year: i32) -> (f64, usize) {
        let values: Vec<(&str, f64)> = if self.is_observed(year) {
            self.history
                .records()
                .iter()
                .filter(|r| r.year == year)
                .map(|r| (r.district.as_str(), r.child_user))
                .collect()
        } else {
            self.forecasts
                .iter()
                .filter(|r| r.year == year)
                .map(|r| (r.district.as_str(), r.predicted_child_user))
                .collect()
        };

        let values: Vec<(&str, f64)> = values.into_iter().filter(|(_, v)| !v.is_nan()).collect();
        let districts: BTreeSet<&str> = values.iter().map(|&(d, _)| d).collect();
        (values.iter().map(|&(_, v)| v).sum(), districts.len())
    }

    fn snapshot(&self, year: i32, district: &str) -> Option<BTreeMap<String, f64>> {
        if self.is_observed(year) {
            self.history
                .get(district, year)
                .map(|record| pick_snapshot(|name| record.value(name)))
        } else {
            self.forecasts
                .iter()
                .find(|r| r.year == year && r.district == district)
                .map(|record| pick_snapshot(|name| record.features.get(name).copied()))
        }
    }
}

fn in_range(year: i32, start_year: Option<i32>, end_year: Option<i32>) -> bool {
    start_year.map_or(true, |start| year >= start) && end_year.map_or(true, |end| year <= end)
}

fn pick_snapshot(lookup: impl Fn(&str) -> Option<f64>) -> BTreeMap<String, f64> {
    SNAPSHOT_FEATURES
        .iter()
        .filter_map(|&name| lookup(name).map(|v| (name.to_string(), v)))
        .collect()
}
