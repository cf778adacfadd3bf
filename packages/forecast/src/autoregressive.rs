//! Recursive multi-step forecasting.
//!
//! Walks the horizon one week at a time. Each step rebuilds every
//! cell's history features from the working history — which, from step
//! two onward, contains the previous steps' raw predictions — so
//! forecast error compounds with the horizon. That compounding is
//! inherent to the design; no correction mechanism is applied.

use std::collections::BTreeMap;

use h3o::CellIndex;
use via_segura_aggregate::RollingState;
use via_segura_models::{PredictionRecord, VehicleCounts, WeeklyCellRecord};
use via_segura_temporal::{HolidayCalendar, add_weeks};

use crate::features::{self, LabelEncoder};
use crate::{ForecastError, Predictor};

/// Default forecast horizon, in weeks.
pub const DEFAULT_HORIZON_WEEKS: u32 = 12;

/// Working state for one cell across the forecast run.
struct CellState {
    cell: CellIndex,
    bairro_encoded: f64,
    rolling: RollingState,
}

/// Forecasts `horizon_weeks` weeks beyond the end of `historical`.
///
/// `historical` must be the dense, history-annotated grid, sorted by
/// (cell, week) as produced by the aggregation pipeline. The cell set
/// is fixed for the whole run: one prediction per (cell, step), weeks
/// strictly increasing, exactly `horizon_weeks` steps.
///
/// Exported predictions are clamped at zero, but the *raw* model
/// output is what enters the working history, and synthetic weeks
/// contribute no vehicle observations — per-vehicle cumulative
/// features stay frozen at their last observed values.
///
/// # Errors
///
/// Returns an error if `historical` is empty, if the model fails on
/// any row, or if it produces a non-finite value.
pub fn forecast(
    model: &dyn Predictor,
    historical: &[WeeklyCellRecord],
    horizon_weeks: u32,
    calendar: &HolidayCalendar,
    encoder: &LabelEncoder,
) -> Result<Vec<PredictionRecord>, ForecastError> {
    let last_observed_week = historical
        .iter()
        .map(|record| record.week_start)
        .max()
        .ok_or(ForecastError::EmptyHistory)?;

    // Replay the observed history into per-cell rolling state, keeping
    // cells in order of first appearance.
    let mut cell_order: BTreeMap<CellIndex, usize> = BTreeMap::new();
    let mut cells: Vec<CellState> = Vec::new();
    for record in historical {
        let index = *cell_order.entry(record.cell).or_insert_with(|| {
            cells.push(CellState {
                cell: record.cell,
                bairro_encoded: encoder.encode(&record.bairro),
                rolling: RollingState::new(),
            });
            cells.len() - 1
        });
        cells[index]
            .rolling
            .push(f64::from(record.num_incidents), &record.vehicles);
    }

    log::info!(
        "Forecasting {horizon_weeks} weeks for {} cells from {last_observed_week}",
        cells.len(),
    );

    let mut predictions = Vec::with_capacity(cells.len() * horizon_weeks as usize);

    for step in 1..=i64::from(horizon_weeks) {
        let target_week = add_weeks(last_observed_week, step);

        for cell_state in &mut cells {
            let row = features::for_future_week(
                target_week,
                &cell_state.rolling.features(),
                calendar,
                cell_state.bairro_encoded,
            );

            let raw = model
                .predict(&row)
                .map_err(|source| ForecastError::Model {
                    cell: cell_state.cell,
                    week_start: target_week,
                    source,
                })?;
            if !raw.is_finite() {
                return Err(ForecastError::NonFinitePrediction {
                    cell: cell_state.cell,
                    week_start: target_week,
                });
            }

            predictions.push(PredictionRecord {
                cell: cell_state.cell,
                week_start: target_week,
                predicted_accidents: raw.max(0.0),
            });

            // The raw, unclamped value becomes next week's history for
            // this cell only; other cells never read it.
            cell_state.rolling.push(raw, &VehicleCounts::default());
        }
    }

    Ok(predictions)
}
