//! Dense grid completion: every observed cell × every observed week.
//!
//! Expands the sparse weekly aggregate to the full cross product, so
//! weeks in which a cell had no accidents appear as explicit zero rows.
//! Works over (cell-index, week-index) positions in a flat arena rather
//! than materializing composite string keys.

use std::collections::BTreeMap;

use chrono::{Datelike as _, NaiveDate};
use h3o::CellIndex;
use via_segura_models::{
    HistoricalFeatures, UNKNOWN_CATEGORY, VehicleCounts, VictimCounts, WeeklyCellRecord,
};
use via_segura_temporal::iso_year_week;

use crate::weekly::{ModeTracker, SparseWeekly};

/// Long-run per-cell statistics used to backfill zero-filled rows.
#[derive(Debug, Default)]
struct CellStats {
    lat_sum: f64,
    lon_sum: f64,
    coord_weeks: u32,
    bairro: ModeTracker,
}

impl CellStats {
    fn observe(&mut self, record: &WeeklyCellRecord) {
        if let (Some(lat), Some(lon)) = (record.latitude, record.longitude) {
            self.lat_sum += lat;
            self.lon_sum += lon;
            self.coord_weeks += 1;
        }
        self.bairro.observe(&record.bairro);
    }

    fn mean_coords(&self) -> (Option<f64>, Option<f64>) {
        if self.coord_weeks == 0 {
            (None, None)
        } else {
            let n = f64::from(self.coord_weeks);
            (Some(self.lat_sum / n), Some(self.lon_sum / n))
        }
    }
}

/// Expands the sparse aggregate into the dense (cell × week) grid.
///
/// Every observed cell is paired with every globally observed week; an
/// unmatched pair becomes a zero row with `num_incidents = 0`, zeroed
/// vehicle/victim sums, year/month reconstructed from the week start,
/// and spatial metadata backfilled from the cell's long-run mean
/// coordinates and modal bairro. Output is sorted by (cell, week).
#[must_use]
pub fn complete_grid(sparse: SparseWeekly) -> Vec<WeeklyCellRecord> {
    let SparseWeekly {
        records,
        observed_weeks,
    } = sparse;

    let weeks: Vec<NaiveDate> = observed_weeks.into_iter().collect();
    let week_index: BTreeMap<NaiveDate, usize> =
        weeks.iter().enumerate().map(|(i, &w)| (w, i)).collect();

    // Records arrive sorted by (cell, week); collect distinct cells in
    // that order.
    let mut cells: Vec<CellIndex> = Vec::new();
    for record in &records {
        if cells.last() != Some(&record.cell) {
            cells.push(record.cell);
        }
    }
    let cell_index: BTreeMap<CellIndex, usize> =
        cells.iter().enumerate().map(|(i, &c)| (c, i)).collect();

    let mut stats: Vec<CellStats> = cells.iter().map(|_| CellStats::default()).collect();

    let mut arena: Vec<Option<WeeklyCellRecord>> = Vec::new();
    arena.resize_with(cells.len() * weeks.len(), || None);

    let observed = records.len();
    for record in records {
        let ci = cell_index[&record.cell];
        let wi = week_index[&record.week_start];
        stats[ci].observe(&record);
        arena[ci * weeks.len() + wi] = Some(record);
    }

    let mut dense = Vec::with_capacity(cells.len() * weeks.len());
    for (ci, &cell) in cells.iter().enumerate() {
        let (mean_lat, mean_lon) = stats[ci].mean_coords();
        let modal_bairro = stats[ci].bairro.mode().unwrap_or(UNKNOWN_CATEGORY).to_string();

        for (wi, &week) in weeks.iter().enumerate() {
            let row = arena[ci * weeks.len() + wi]
                .take()
                .unwrap_or_else(|| zero_row(cell, week, mean_lat, mean_lon, &modal_bairro));
            dense.push(row);
        }
    }

    log::info!(
        "Completed grid: {} cells x {} weeks = {} rows ({} observed, {} zero-filled)",
        cells.len(),
        weeks.len(),
        dense.len(),
        observed,
        dense.len() - observed,
    );

    dense
}

fn zero_row(
    cell: CellIndex,
    week: NaiveDate,
    latitude: Option<f64>,
    longitude: Option<f64>,
    bairro: &str,
) -> WeeklyCellRecord {
    WeeklyCellRecord {
        cell,
        year_week: iso_year_week(week),
        week_start: week,
        num_incidents: 0,
        vehicles: VehicleCounts::default(),
        victims: VictimCounts::default(),
        year: week.year(),
        month: week.month(),
        holiday: false,
        weekend: false,
        latitude,
        longitude,
        bairro: bairro.to_string(),
        history: HistoricalFeatures::default(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};

    use super::*;
    use crate::weekly::aggregate_weekly;
    use via_segura_models::AccidentEvent;

    fn cell_a() -> CellIndex {
        "8928308280fffff".parse().unwrap()
    }

    fn cell_b() -> CellIndex {
        "8928308280bffff".parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(cell: Option<CellIndex>, day: NaiveDate, lat: f64, bairro: &str) -> AccidentEvent {
        AccidentEvent {
            date: day,
            hour: None,
            cell,
            latitude: cell.map(|_| lat),
            longitude: cell.map(|_| -34.9),
            vehicles: VehicleCounts {
                auto: 1,
                ..VehicleCounts::default()
            },
            victims: VictimCounts::default(),
            bairro: bairro.to_string(),
            endereco: "rua teste".to_string(),
            holiday: false,
            weekend: false,
        }
    }

    fn dense_from(events: &[AccidentEvent]) -> Vec<WeeklyCellRecord> {
        complete_grid(aggregate_weekly(events, &BTreeSet::new()).unwrap())
    }

    #[test]
    fn grid_is_dense_with_no_duplicates_or_gaps() {
        let dense = dense_from(&[
            event(Some(cell_a()), date(2024, 6, 10), -8.05, "derby"),
            event(Some(cell_a()), date(2024, 6, 24), -8.05, "derby"),
            event(Some(cell_b()), date(2024, 6, 17), -8.06, "graças"),
        ]);

        // 2 cells x 3 weeks.
        assert_eq!(dense.len(), 6);

        let keys: HashSet<(CellIndex, NaiveDate)> =
            dense.iter().map(|r| (r.cell, r.week_start)).collect();
        assert_eq!(keys.len(), 6, "duplicate (cell, week) rows");

        for cell in [cell_a(), cell_b()] {
            for week in [date(2024, 6, 10), date(2024, 6, 17), date(2024, 6, 24)] {
                assert!(keys.contains(&(cell, week)), "missing ({cell}, {week})");
            }
        }
    }

    #[test]
    fn unmatched_pairs_are_zero_filled() {
        let dense = dense_from(&[
            event(Some(cell_a()), date(2024, 6, 10), -8.05, "derby"),
            event(Some(cell_b()), date(2024, 6, 17), -8.06, "graças"),
        ]);

        let filled = dense
            .iter()
            .find(|r| r.cell == cell_a() && r.week_start == date(2024, 6, 17))
            .unwrap();
        assert_eq!(filled.num_incidents, 0);
        assert_eq!(filled.vehicles, VehicleCounts::default());
        assert_eq!(filled.victims, VictimCounts::default());
        assert_eq!(filled.year, 2024);
        assert_eq!(filled.month, 6);
        assert_eq!(filled.year_week, 2024_25);
    }

    #[test]
    fn zero_rows_backfill_cell_level_spatial_metadata() {
        let dense = dense_from(&[
            event(Some(cell_a()), date(2024, 6, 10), -8.04, "derby"),
            event(Some(cell_a()), date(2024, 6, 24), -8.06, "derby"),
            event(Some(cell_b()), date(2024, 6, 17), -8.10, "graças"),
        ]);

        let filled = dense
            .iter()
            .find(|r| r.cell == cell_a() && r.week_start == date(2024, 6, 17))
            .unwrap();
        // Mean of the cell's two observed weekly coordinates.
        assert!((filled.latitude.unwrap() - (-8.05)).abs() < 1e-9);
        assert_eq!(filled.bairro, "derby");
    }

    #[test]
    fn week_axis_includes_weeks_seen_only_by_cell_less_events() {
        let dense = dense_from(&[
            event(Some(cell_a()), date(2024, 6, 10), -8.05, "derby"),
            event(None, date(2024, 7, 1), -8.05, "derby"),
        ]);

        // Weeks of 6-10 and 7-01 observed; 6-17 and 6-24 were not
        // observed anywhere, so they are absent. Known characteristic.
        assert_eq!(dense.len(), 2);
        assert!(dense.iter().any(|r| r.week_start == date(2024, 7, 1)));
        assert!(!dense.iter().any(|r| r.week_start == date(2024, 6, 17)));
    }
}
