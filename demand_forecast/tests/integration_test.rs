use demand_forecast::data::{CsvHistoricalSource, HistoricalSource};
use demand_forecast::export::CsvForecastSink;
use demand_forecast::models::LinearModelArtifact;
use demand_forecast::{ForecastError, ProjectionConfig, ProjectionPipeline};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

// Helper function to write a small registry extract
fn create_history_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();

    writeln!(file, "district,year,population,grdp,child_facility,child_user").unwrap();
    for (k, year) in (2015..=2022).enumerate() {
        let k = k as f64;
        writeln!(
            file,
            "Gangnam,{},{},{},{},{}",
            year,
            500000.0 * 1.01_f64.powf(k),
            90000.0 * 1.03_f64.powf(k),
            20,
            100.0 * 1.08_f64.powf(k)
        )
        .unwrap();
        writeln!(
            file,
            "Mapo,{},{},{},{},{}",
            year,
            380000.0 * 0.99_f64.powf(k),
            40000.0 * 1.02_f64.powf(k),
            35,
            300.0 * 0.97_f64.powf(k)
        )
        .unwrap();
        writeln!(
            file,
            "Jongno,{},{},{},{},{}",
            year,
            150000.0,
            60000.0,
            12,
            80.0 + 4.0 * k
        )
        .unwrap();
    }

    file
}

fn create_model_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "version": "linear-test-1",
            "base_features": ["year", "population", "grdp"],
            "district_columns": ["district_Gangnam", "district_Jongno", "district_Mapo"],
            "intercept": 4.0,
            "coefficients": {{
                "year": 0.0,
                "population": 0.000001,
                "grdp": 0.0,
                "district_Gangnam": 0.5,
                "district_Jongno": 2.5,
                "district_Mapo": 1.0
            }}
        }}"#
    )
    .unwrap();
    file
}

#[test]
fn test_full_projection_workflow() {
    // 1. Create sample files
    let history = create_history_file();
    let model_file = create_model_file();
    let mut config_file = NamedTempFile::new().unwrap();
    writeln!(config_file, "model_version = \"xgb-2024\"").unwrap();
    writeln!(config_file, "[years]\nfuture_end = 2027").unwrap();

    // 2. Load configuration, model and data
    let config = ProjectionConfig::from_toml_file(config_file.path()).unwrap();
    let model = LinearModelArtifact::from_json_file(model_file.path()).unwrap();
    let source = CsvHistoricalSource::new(history.path());
    let table = source.load().unwrap();
    assert_eq!(table.len(), 24);
    assert_eq!(table.districts().len(), 3);

    // 3. Run the pipeline into a CSV sink
    let out_dir = tempdir().unwrap();
    let out_path = out_dir.path().join("forecast.csv");
    let pipeline = ProjectionPipeline::new(config, model).unwrap();
    let mut sink = CsvForecastSink::new(&out_path);
    let report = pipeline.run_into(&source, &mut sink).unwrap();

    // 4. Three districts over 2023..=2027
    assert_eq!(report.records.len(), 15);
    assert!(report.skipped_districts.is_empty());
    assert_eq!(report.records[0].district, "Gangnam");
    assert_eq!(report.records[0].year, 2023);
    assert!(report.records.iter().all(|r| r.model_version == "xgb-2024"));

    // 5. Jongno's raw predictions are far above its history, so the first
    //    horizon year sits exactly on the upper ratio bound
    let jongno_2023 = report
        .records
        .iter()
        .find(|r| r.district == "Jongno" && r.year == 2023)
        .unwrap();
    let last_observed = table.get("Jongno", 2022).unwrap().child_user;
    let expected = last_observed * report.bounds.max_year_ratio;
    assert!((jongno_2023.predicted_child_user - expected).abs() < 1e-9);

    // 6. The exported table has one line per record plus a header
    let content = std::fs::read_to_string(&out_path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next().unwrap(),
        "district,year,predicted_child_user,grdp,population,model_version,created_at"
    );
    assert_eq!(lines.count(), 15);
}

#[test]
fn test_missing_history_file() {
    let source = CsvHistoricalSource::new("/nonexistent/path.csv");
    let result = source.load();
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}
