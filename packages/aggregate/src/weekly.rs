//! Weekly aggregation of raw events into sparse (cell, week) rows.
//!
//! Groups cell-assigned events by [`CellWeekKey`] and reduces each
//! group with column-specific rules: counts and victim/vehicle columns
//! sum, calendar flags take the max, year/month/coordinates take the
//! first observed value, and categorical columns take the mode.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike as _, NaiveDate};
use via_segura_models::{
    AccidentEvent, CellWeekKey, HistoricalFeatures, UNKNOWN_CATEGORY, VehicleCounts, VictimCounts,
    WeeklyCellRecord,
};
use via_segura_temporal::week_start;

use crate::AggregateError;

/// Sparse weekly aggregate plus the global observed-week axis.
///
/// The week axis is recorded from every non-excluded event — including
/// events without a cell assignment — so the dense grid spans weeks
/// that only cell-less events witnessed. Weeks with no events at all
/// anywhere are *not* represented; a cell inactive outside the bulk of
/// the observation period is only backfilled across globally observed
/// weeks. Known characteristic of the grid construction.
#[derive(Debug, Clone)]
pub struct SparseWeekly {
    /// One row per observed (cell, week), sorted by (cell, week).
    pub records: Vec<WeeklyCellRecord>,
    /// Mondays of every ISO week observed in the (filtered) event set.
    pub observed_weeks: BTreeSet<NaiveDate>,
}

/// Frequency tracker for the per-group categorical mode.
///
/// Ties break toward the first-encountered value; an empty tracker
/// yields no mode and callers fall back to the `"unknown"` sentinel.
#[derive(Debug, Clone, Default)]
pub(crate) struct ModeTracker {
    counts: BTreeMap<String, (usize, usize)>,
    next_rank: usize,
}

impl ModeTracker {
    pub(crate) fn observe(&mut self, value: &str) {
        let rank = self.next_rank;
        let entry = self.counts.entry(value.to_string()).or_insert((0, rank));
        entry.0 += 1;
        self.next_rank += 1;
    }

    pub(crate) fn mode(&self) -> Option<&str> {
        self.counts
            .iter()
            .max_by(|a, b| {
                let (count_a, rank_a) = a.1;
                let (count_b, rank_b) = b.1;
                count_a.cmp(count_b).then(rank_b.cmp(rank_a))
            })
            .map(|(value, _)| value.as_str())
    }
}

/// Reduction state for one (cell, week) group.
#[derive(Debug, Default)]
struct Bucket {
    num_incidents: u32,
    vehicles: VehicleCounts,
    victims: VictimCounts,
    holiday: bool,
    weekend: bool,
    year: i32,
    month: u32,
    latitude: Option<f64>,
    longitude: Option<f64>,
    bairro: ModeTracker,
}

impl Bucket {
    fn observe(&mut self, event: &AccidentEvent) {
        if self.num_incidents == 0 {
            self.year = event.date.year();
            self.month = event.date.month();
        }
        self.num_incidents += 1;
        self.vehicles.accumulate(&event.vehicles);
        self.victims.accumulate(&event.victims);
        self.holiday |= event.holiday;
        self.weekend |= event.weekend;

        if self.latitude.is_none() {
            self.latitude = event.latitude;
        }
        if self.longitude.is_none() {
            self.longitude = event.longitude;
        }

        self.bairro.observe(&event.bairro);
    }

    fn into_record(self, key: CellWeekKey) -> WeeklyCellRecord {
        WeeklyCellRecord {
            cell: key.cell,
            year_week: key.year_week,
            week_start: key.week_start,
            num_incidents: self.num_incidents,
            vehicles: self.vehicles,
            victims: self.victims,
            year: self.year,
            month: self.month,
            holiday: self.holiday,
            weekend: self.weekend,
            latitude: self.latitude,
            longitude: self.longitude,
            bairro: self
                .bairro
                .mode()
                .unwrap_or(UNKNOWN_CATEGORY)
                .to_string(),
            history: HistoricalFeatures::default(),
        }
    }
}

/// Aggregates events into one sparse row per observed (cell, week).
///
/// Events whose calendar year is in `exclude_years` are dropped before
/// grouping — excluded periods contribute no data and no weeks, so they
/// do not reappear as zero-filled gaps downstream. Events without a
/// cell are dropped from the aggregate but still extend the observed
/// week axis.
///
/// # Errors
///
/// Returns [`AggregateError::NoSpatialData`] when no group forms, i.e.
/// no non-excluded event carries a cell assignment.
pub fn aggregate_weekly(
    events: &[AccidentEvent],
    exclude_years: &BTreeSet<i32>,
) -> Result<SparseWeekly, AggregateError> {
    let mut groups: BTreeMap<CellWeekKey, Bucket> = BTreeMap::new();
    let mut observed_weeks = BTreeSet::new();
    let mut dropped_excluded = 0_usize;
    let mut dropped_no_cell = 0_usize;

    for event in events {
        if exclude_years.contains(&event.date.year()) {
            dropped_excluded += 1;
            continue;
        }

        observed_weeks.insert(week_start(event.date));

        let Some(cell) = event.cell else {
            dropped_no_cell += 1;
            continue;
        };

        groups
            .entry(CellWeekKey::from_date(cell, event.date))
            .or_default()
            .observe(event);
    }

    if groups.is_empty() {
        return Err(AggregateError::NoSpatialData);
    }

    log::info!(
        "Aggregated {} events into {} (cell, week) groups across {} weeks ({} excluded-year, {} cell-less dropped)",
        events.len() - dropped_excluded - dropped_no_cell,
        groups.len(),
        observed_weeks.len(),
        dropped_excluded,
        dropped_no_cell,
    );

    let records = groups
        .into_iter()
        .map(|(key, bucket)| bucket.into_record(key))
        .collect();

    Ok(SparseWeekly {
        records,
        observed_weeks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use h3o::CellIndex;

    fn cell_a() -> CellIndex {
        "8928308280fffff".parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(cell: Option<CellIndex>, day: NaiveDate, auto: u32, bairro: &str) -> AccidentEvent {
        AccidentEvent {
            date: day,
            hour: Some(9),
            cell,
            latitude: cell.map(|_| -8.05),
            longitude: cell.map(|_| -34.9),
            vehicles: VehicleCounts {
                auto,
                ..VehicleCounts::default()
            },
            victims: VictimCounts::default(),
            bairro: bairro.to_string(),
            endereco: "rua teste".to_string(),
            holiday: false,
            weekend: false,
        }
    }

    #[test]
    fn sums_vehicle_counts_within_a_group() {
        let events = vec![
            event(Some(cell_a()), date(2024, 6, 10), 1, "boa vista"),
            event(Some(cell_a()), date(2024, 6, 12), 2, "boa vista"),
        ];

        let sparse = aggregate_weekly(&events, &BTreeSet::new()).unwrap();
        assert_eq!(sparse.records.len(), 1);

        let record = &sparse.records[0];
        assert_eq!(record.num_incidents, 2);
        assert_eq!(record.vehicles.auto, 3);
        assert_eq!(record.week_start, date(2024, 6, 10));
    }

    #[test]
    fn mode_prefers_most_frequent_then_first_encountered() {
        let events = vec![
            event(Some(cell_a()), date(2024, 6, 10), 0, "derby"),
            event(Some(cell_a()), date(2024, 6, 11), 0, "boa vista"),
            event(Some(cell_a()), date(2024, 6, 12), 0, "boa vista"),
        ];
        let sparse = aggregate_weekly(&events, &BTreeSet::new()).unwrap();
        assert_eq!(sparse.records[0].bairro, "boa vista");

        // Tie: first encountered wins.
        let events = vec![
            event(Some(cell_a()), date(2024, 6, 10), 0, "derby"),
            event(Some(cell_a()), date(2024, 6, 11), 0, "boa vista"),
        ];
        let sparse = aggregate_weekly(&events, &BTreeSet::new()).unwrap();
        assert_eq!(sparse.records[0].bairro, "derby");
    }

    #[test]
    fn excluded_years_contribute_no_rows_and_no_weeks() {
        let events = vec![
            event(Some(cell_a()), date(2020, 6, 8), 1, "derby"),
            event(Some(cell_a()), date(2024, 6, 10), 1, "derby"),
        ];
        let exclude: BTreeSet<i32> = [2020, 2021].into_iter().collect();

        let sparse = aggregate_weekly(&events, &exclude).unwrap();
        assert_eq!(sparse.records.len(), 1);
        assert_eq!(sparse.records[0].year, 2024);
        assert!(!sparse.observed_weeks.contains(&date(2020, 6, 8)));
    }

    #[test]
    fn cell_less_events_extend_the_week_axis_only() {
        let events = vec![
            event(Some(cell_a()), date(2024, 6, 10), 1, "derby"),
            event(None, date(2024, 6, 17), 1, "derby"),
        ];

        let sparse = aggregate_weekly(&events, &BTreeSet::new()).unwrap();
        assert_eq!(sparse.records.len(), 1);
        assert!(sparse.observed_weeks.contains(&date(2024, 6, 17)));
    }

    #[test]
    fn no_spatial_data_fails_fast() {
        let events = vec![event(None, date(2024, 6, 10), 1, "derby")];
        assert!(matches!(
            aggregate_weekly(&events, &BTreeSet::new()),
            Err(AggregateError::NoSpatialData)
        ));
    }

    #[test]
    fn holiday_flag_is_max_over_the_week() {
        let mut holiday_event = event(Some(cell_a()), date(2024, 6, 11), 0, "derby");
        holiday_event.holiday = true;
        let events = vec![
            event(Some(cell_a()), date(2024, 6, 10), 0, "derby"),
            holiday_event,
        ];

        let sparse = aggregate_weekly(&events, &BTreeSet::new()).unwrap();
        assert!(sparse.records[0].holiday);
    }
}
