//! Batch pipeline stages for the forecasting CLI.
//!
//! Chains ingest -> aggregate -> grid completion -> history -> train ->
//! forecast -> export. Every stage is synchronous and deterministic for
//! a fixed input and seed; stage timings go to the log.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Datelike as _;
use via_segura_aggregate::{add_history, aggregate_weekly, complete_grid};
use via_segura_export::{
    RunMetadata, write_cell_metadata, write_metadata, write_monthly_heatmap,
    write_weekly_predictions,
};
use via_segura_forecast::{
    FEATURE_NAMES, LabelEncoder, PoissonConfig, PoissonRegressor, features, forecast,
};
use via_segura_ingest::{load_events, spatial::CELL_RESOLUTION};
use via_segura_models::WeeklyCellRecord;
use via_segura_temporal::{HolidayCalendar, add_weeks};

/// Arguments for the full forecast pipeline.
pub struct ForecastArgs {
    /// Path to the raw semicolon-delimited export.
    pub input: PathBuf,
    /// Path to the geocode cache JSON.
    pub geocode_cache: PathBuf,
    /// Directory receiving the exported artifacts.
    pub output_dir: PathBuf,
    /// Number of weeks to forecast past the last observed week.
    pub horizon_weeks: u32,
    /// Calendar years excluded before aggregation.
    pub exclude_years: BTreeSet<i32>,
    /// Seed for the coordinate jitter.
    pub seed: u64,
    /// Training epochs for the Poisson regressor.
    pub epochs: usize,
}

/// Arguments for the historical heatmap export.
pub struct HeatmapArgs {
    /// Path to the raw semicolon-delimited export.
    pub input: PathBuf,
    /// Path to the geocode cache JSON.
    pub geocode_cache: PathBuf,
    /// Directory receiving the exported artifacts.
    pub output_dir: PathBuf,
    /// Calendar years excluded before aggregation.
    pub exclude_years: BTreeSet<i32>,
    /// Seed for the coordinate jitter.
    pub seed: u64,
}

/// Runs the full pipeline: ingest through artifact export.
///
/// # Errors
///
/// Returns an error if any stage fails: unreadable inputs, no spatial
/// data, training failure, a model error mid-forecast, or an export
/// I/O failure.
pub fn run_forecast(args: &ForecastArgs) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    let dense = build_dense_grid(
        &args.input,
        &args.geocode_cache,
        args.seed,
        &args.exclude_years,
    )?;

    let encoder = LabelEncoder::fit(dense.iter().map(|record| record.bairro.as_str()));
    let rows: Vec<_> = dense
        .iter()
        .map(|record| features::from_record(record, &encoder))
        .collect();
    let targets: Vec<f64> = dense
        .iter()
        .map(|record| f64::from(record.num_incidents))
        .collect();

    let config = PoissonConfig {
        epochs: args.epochs,
        ..PoissonConfig::default()
    };
    let model = PoissonRegressor::fit(&rows, &targets, &config)?;
    let metrics = model.evaluate(&rows, &targets);
    log::info!(
        "Trained Poisson regressor on {} rows: MAE={:.4}, RMSE={:.4}, deviance={:.4}",
        rows.len(),
        metrics.mae,
        metrics.rmse,
        metrics.poisson_deviance,
    );

    // The holiday calendar must cover the forecast horizon, not just
    // the observed years.
    let first_year = dense.iter().map(|record| record.year).min().unwrap_or(1970);
    let last_week = dense
        .iter()
        .map(|record| record.week_start)
        .max()
        .ok_or("empty dense grid")?;
    let horizon_end = add_weeks(last_week, i64::from(args.horizon_weeks) + 1);
    let calendar = HolidayCalendar::for_years(first_year..=horizon_end.year());

    let predictions = forecast(
        &model,
        &dense,
        args.horizon_weeks,
        &calendar,
        &encoder,
    )?;

    std::fs::create_dir_all(&args.output_dir)?;
    write_weekly_predictions(
        &args.output_dir.join("weekly_predictions.csv"),
        &predictions,
    )?;
    write_monthly_heatmap(&args.output_dir.join("monthly_heatmap.csv"), &dense)?;
    write_cell_metadata(&args.output_dir.join("cell_metadata.csv"), &dense)?;
    write_metadata(
        &args.output_dir.join("metadata.json"),
        &RunMetadata {
            generated_at: chrono::Utc::now().to_rfc3339(),
            h3_resolution: CELL_RESOLUTION.into(),
            horizon_weeks: args.horizon_weeks,
            features: FEATURE_NAMES.iter().map(ToString::to_string).collect(),
        },
    )?;

    log::info!(
        "Forecast pipeline complete: {} predictions in {:.1}s",
        predictions.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Exports the historical heatmap and cell metadata without training.
///
/// # Errors
///
/// Returns an error if ingestion, aggregation, or export fails.
pub fn run_heatmap(args: &HeatmapArgs) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    let dense = build_dense_grid(
        &args.input,
        &args.geocode_cache,
        args.seed,
        &args.exclude_years,
    )?;

    std::fs::create_dir_all(&args.output_dir)?;
    write_monthly_heatmap(&args.output_dir.join("monthly_heatmap.csv"), &dense)?;
    write_cell_metadata(&args.output_dir.join("cell_metadata.csv"), &dense)?;

    log::info!(
        "Heatmap export complete in {:.1}s",
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Shared front half of both pipelines: ingest, aggregate, complete,
/// and annotate with historical features.
fn build_dense_grid(
    input: &std::path::Path,
    geocode_cache: &std::path::Path,
    seed: u64,
    exclude_years: &BTreeSet<i32>,
) -> Result<Vec<WeeklyCellRecord>, Box<dyn std::error::Error>> {
    let (events, _summary) = load_events(input, geocode_cache, seed)?;

    let sparse = aggregate_weekly(&events, exclude_years)?;
    let mut dense = complete_grid(sparse);
    add_history(&mut dense);

    Ok(dense)
}
