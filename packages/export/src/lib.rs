#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Export of prediction and historical artifacts for the backend.
//!
//! Four outputs per run: the weekly prediction table, a monthly
//! historical heatmap, per-cell metadata, and a JSON metadata document
//! describing how the artifacts were generated. All tabular outputs
//! are plain CSV with stable column names.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use via_segura_models::{PredictionRecord, WeeklyCellRecord};

/// Error type for artifact export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem error creating or writing an output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Run-level metadata written alongside the tabular artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    /// ISO 8601 generation timestamp.
    pub generated_at: String,
    /// H3 resolution of the spatial cells.
    pub h3_resolution: u8,
    /// Forecast horizon, in weeks.
    pub horizon_weeks: u32,
    /// Model feature columns, in order.
    pub features: Vec<String>,
}

#[derive(Serialize)]
struct PredictionRow {
    cell: String,
    week_start: NaiveDate,
    predicted_accidents: f64,
}

#[derive(Serialize)]
struct HeatmapRow {
    cell: String,
    year: i32,
    month: u32,
    num_incidents: u64,
}

#[derive(Serialize)]
struct CellMetadataRow {
    cell: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    bairro: String,
}

/// Writes the weekly prediction table.
///
/// # Errors
///
/// Returns an error if the file cannot be created or a row fails to
/// serialize.
pub fn write_weekly_predictions(
    path: &Path,
    predictions: &[PredictionRecord],
) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for prediction in predictions {
        writer.serialize(PredictionRow {
            cell: prediction.cell.to_string(),
            week_start: prediction.week_start,
            predicted_accidents: prediction.predicted_accidents,
        })?;
    }
    writer.flush()?;

    log::info!(
        "Wrote {} predictions to {}",
        predictions.len(),
        path.display()
    );
    Ok(())
}

/// Writes the monthly historical heatmap: incidents summed per
/// (cell, year, month) over the dense grid.
///
/// # Errors
///
/// Returns an error if the file cannot be created or a row fails to
/// serialize.
pub fn write_monthly_heatmap(
    path: &Path,
    records: &[WeeklyCellRecord],
) -> Result<(), ExportError> {
    let mut totals: BTreeMap<(String, i32, u32), u64> = BTreeMap::new();
    for record in records {
        *totals
            .entry((record.cell.to_string(), record.year, record.month))
            .or_insert(0) += u64::from(record.num_incidents);
    }

    let mut writer = csv::Writer::from_path(path)?;
    let rows = totals.len();
    for ((cell, year, month), num_incidents) in totals {
        writer.serialize(HeatmapRow {
            cell,
            year,
            month,
            num_incidents,
        })?;
    }
    writer.flush()?;

    log::info!("Wrote {rows} heatmap rows to {}", path.display());
    Ok(())
}

/// Writes per-cell metadata: representative coordinates and bairro.
///
/// Takes the first row of each cell in the (cell, week)-sorted grid;
/// after grid completion every row carries backfilled spatial metadata,
/// so the first row is as representative as any.
///
/// # Errors
///
/// Returns an error if the file cannot be created or a row fails to
/// serialize.
pub fn write_cell_metadata(
    path: &Path,
    records: &[WeeklyCellRecord],
) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut rows = 0_usize;
    let mut last_cell = None;

    for record in records {
        if last_cell == Some(record.cell) {
            continue;
        }
        last_cell = Some(record.cell);
        rows += 1;
        writer.serialize(CellMetadataRow {
            cell: record.cell.to_string(),
            latitude: record.latitude,
            longitude: record.longitude,
            bairro: record.bairro.clone(),
        })?;
    }
    writer.flush()?;

    log::info!("Wrote {rows} cell metadata rows to {}", path.display());
    Ok(())
}

/// Writes the run metadata JSON document.
///
/// # Errors
///
/// Returns an error if the file cannot be created or serialized.
pub fn write_metadata(path: &Path, metadata: &RunMetadata) -> Result<(), ExportError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), metadata)?;
    log::info!("Wrote run metadata to {}", path.display());
    Ok(())
}
