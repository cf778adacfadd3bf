#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the accident forecasting pipeline.
//!
//! Two batch subcommands: `forecast` runs the full pipeline from the
//! raw export to the prediction artifacts; `heatmap` exports only the
//! historical aggregates. Logging goes through `pretty_env_logger`
//! (set `RUST_LOG=info` for stage-by-stage progress).

mod pipeline;

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use via_segura_forecast::DEFAULT_HORIZON_WEEKS;

#[derive(Parser)]
#[command(name = "via_segura_cli", about = "Traffic accident forecasting pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: ingest, aggregate, train, forecast, export
    Forecast {
        /// Path to the raw semicolon-delimited accident export
        #[arg(long)]
        input: PathBuf,
        /// Path to the geocode cache JSON
        #[arg(long)]
        geocode_cache: PathBuf,
        /// Output directory for the exported artifacts
        #[arg(long, default_value = "backend_export")]
        output_dir: PathBuf,
        /// Forecast horizon in weeks
        #[arg(long, default_value_t = DEFAULT_HORIZON_WEEKS)]
        horizon: u32,
        /// Comma-separated calendar years to exclude (e.g., pandemic years)
        #[arg(long, default_value = "2020,2021")]
        exclude_years: String,
        /// Seed for the coordinate jitter
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Training epochs for the Poisson regressor
        #[arg(long, default_value_t = 1000)]
        epochs: usize,
    },
    /// Export only the historical heatmap and cell metadata
    Heatmap {
        /// Path to the raw semicolon-delimited accident export
        #[arg(long)]
        input: PathBuf,
        /// Path to the geocode cache JSON
        #[arg(long)]
        geocode_cache: PathBuf,
        /// Output directory for the exported artifacts
        #[arg(long, default_value = "backend_export")]
        output_dir: PathBuf,
        /// Comma-separated calendar years to exclude (e.g., pandemic years)
        #[arg(long, default_value = "2020,2021")]
        exclude_years: String,
        /// Seed for the coordinate jitter
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Forecast {
            input,
            geocode_cache,
            output_dir,
            horizon,
            exclude_years,
            seed,
            epochs,
        } => pipeline::run_forecast(&pipeline::ForecastArgs {
            input,
            geocode_cache,
            output_dir,
            horizon_weeks: horizon,
            exclude_years: parse_years(&exclude_years)?,
            seed,
            epochs,
        }),
        Commands::Heatmap {
            input,
            geocode_cache,
            output_dir,
            exclude_years,
            seed,
        } => pipeline::run_heatmap(&pipeline::HeatmapArgs {
            input,
            geocode_cache,
            output_dir,
            exclude_years: parse_years(&exclude_years)?,
            seed,
        }),
    }
}

/// Parses a comma-separated year list; an empty string means none.
fn parse_years(raw: &str) -> Result<BTreeSet<i32>, Box<dyn std::error::Error>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i32>()
                .map_err(|_| format!("invalid year in --exclude-years: `{part}`").into())
        })
        .collect()
}
