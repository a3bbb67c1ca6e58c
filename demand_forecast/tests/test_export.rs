use chrono::{TimeZone, Utc};
use demand_forecast::export::{CsvForecastSink, ForecastSink};
use demand_forecast::ForecastRecord;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use tempfile::tempdir;

fn record(district: &str, year: i32, value: f64) -> ForecastRecord {
    let mut features = BTreeMap::new();
    features.insert("population".to_string(), 1000.5);
    features.insert("grdp".to_string(), 42.0);
    ForecastRecord {
        district: district.to_string(),
        year,
        predicted_child_user: value,
        features,
        model_version: "v1".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
    }
}

#[test]
fn test_csv_sink_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let mut sink = CsvForecastSink::new(&path);
    sink.write_forecasts(&[record("Mapo", 2023, 1500.0), record("Mapo", 2024, 1650.25)])
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "district,year,predicted_child_user,grdp,population,model_version,created_at",
            "Mapo,2023,1500,42,1000.5,v1,2024-01-02T03:04:05Z",
            "Mapo,2024,1650.25,42,1000.5,v1,2024-01-02T03:04:05Z",
        ]
    );
}

#[test]
fn test_csv_sink_byte_order_mark() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let mut sink = CsvForecastSink::new(&path).with_byte_order_mark(true);
    sink.write_forecasts(&[record("마포구", 2023, 1.0)]).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    assert!(String::from_utf8(bytes).unwrap().contains("마포구,2023"));
}
