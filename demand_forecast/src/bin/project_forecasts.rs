//! Batch job producing the district forecast table.

use clap::Parser;
use demand_forecast::data::CsvHistoricalSource;
use demand_forecast::export::CsvForecastSink;
use demand_forecast::models::LinearModelArtifact;
use demand_forecast::{ProjectionConfig, ProjectionPipeline};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "project_forecasts",
    about = "Project district child-centre demand over the forecast horizon"
)]
struct Args {
    /// Projection config (TOML); defaults apply when omitted
    #[arg(long, env = "DEMAND_FORECAST_CONFIG")]
    config: Option<PathBuf>,

    /// Historical registry CSV
    #[arg(long, env = "DEMAND_FORECAST_HISTORY")]
    history: PathBuf,

    /// Model artifact (JSON)
    #[arg(long, env = "DEMAND_FORECAST_MODEL")]
    model: PathBuf,

    /// Output forecast CSV
    #[arg(long, env = "DEMAND_FORECAST_OUTPUT")]
    output: PathBuf,

    /// Write a UTF-8 byte order mark for spreadsheet tools
    #[arg(long)]
    bom: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demand_forecast=info,project_forecasts=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ProjectionConfig::from_toml_file(path)?,
        None => ProjectionConfig::default(),
    };
    let model = LinearModelArtifact::from_json_file(&args.model)?;

    tracing::info!(
        history = %args.history.display(),
        model = %args.model.display(),
        output = %args.output.display(),
        "starting projection"
    );

    let pipeline = ProjectionPipeline::new(config, model)?;
    let source = CsvHistoricalSource::new(&args.history);
    let mut sink = CsvForecastSink::new(&args.output).with_byte_order_mark(args.bom);

    let report = pipeline.run_into(&source, &mut sink).inspect_err(|e| {
        tracing::error!("Projection failed: {}", e);
    })?;

    if !report.skipped_districts.is_empty() {
        tracing::warn!(
            skipped = ?report.skipped_districts,
            "districts without a last-year row were left out"
        );
    }
    tracing::info!(rows = report.records.len(), "projection complete");

    Ok(())
}
