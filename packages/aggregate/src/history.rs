//! Backward-looking lag and rolling-window features.
//!
//! A single forward pass per cell maintains a [`RollingState`] — a
//! bounded window of recent weekly counts plus running cumulative
//! sums — instead of recomputing full reductions per row. The same
//! state type drives the batch derivation here and the week-by-week
//! recomputation inside the autoregressive forecaster, so both stages
//! share one set of formulas.

use std::collections::VecDeque;

use via_segura_models::{HistoricalFeatures, VehicleCounts, WeeklyCellRecord};

/// Short lag/rolling window length, in weeks.
pub const WINDOW_SHORT: usize = 4;

/// Long rolling window length, in weeks.
pub const WINDOW_LONG: usize = 12;

/// Per-cell rolling accumulator over weekly counts.
///
/// `features()` reflects only values pushed so far, so reading features
/// before pushing the current week yields strictly-prior statistics.
/// Insufficient history yields 0.0; zero stands in for "no history"
/// rather than a missing-data sentinel. Preserved behavior.
#[derive(Debug, Clone, Default)]
pub struct RollingState {
    window: VecDeque<f64>,
    cumulative_total: f64,
    auto: f64,
    moto: f64,
    onibus: f64,
    caminhao: f64,
}

impl RollingState {
    /// Creates an empty state (a cell with no history yet).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the feature set from the weeks pushed so far.
    #[must_use]
    pub fn features(&self) -> HistoricalFeatures {
        HistoricalFeatures {
            lag_1w: self.window.back().copied().unwrap_or(0.0),
            lag_4w: self.lag(WINDOW_SHORT),
            mean_4w: self.trailing_mean(WINDOW_SHORT),
            mean_12w: self.trailing_mean(WINDOW_LONG),
            cumulative_total: self.cumulative_total,
            auto_hist: self.auto,
            moto_hist: self.moto,
            onibus_hist: self.onibus,
            caminhao_hist: self.caminhao,
        }
    }

    /// Appends one week of observations.
    ///
    /// `incidents` is a float so the forecaster can push raw (possibly
    /// fractional, possibly negative) model outputs into the working
    /// history.
    pub fn push(&mut self, incidents: f64, vehicles: &VehicleCounts) {
        self.window.push_back(incidents);
        if self.window.len() > WINDOW_LONG {
            self.window.pop_front();
        }

        self.cumulative_total += incidents;
        self.auto += f64::from(vehicles.auto);
        self.moto += f64::from(vehicles.moto);
        self.onibus += f64::from(vehicles.onibus);
        self.caminhao += f64::from(vehicles.caminhao);
    }

    fn lag(&self, weeks_back: usize) -> f64 {
        if self.window.len() < weeks_back {
            0.0
        } else {
            self.window[self.window.len() - weeks_back]
        }
    }

    /// Mean over the most recent `window` weeks, narrowing to however
    /// many exist (minimum one); 0.0 with no history at all.
    fn trailing_mean(&self, window: usize) -> f64 {
        let len = self.window.len().min(window);
        if len == 0 {
            return 0.0;
        }
        let start = self.window.len() - len;
        #[allow(clippy::cast_precision_loss)]
        let mean = self.window.iter().skip(start).sum::<f64>() / len as f64;
        mean
    }
}

/// Derives historical features for every row of the dense grid.
///
/// Sorts by (cell, week) and walks each cell's sequence once; row `i`
/// receives features computed from rows `0..i` of the same cell only.
pub fn add_history(records: &mut Vec<WeeklyCellRecord>) {
    records.sort_by(|a, b| (a.cell, a.week_start).cmp(&(b.cell, b.week_start)));

    let mut current_cell = None;
    let mut state = RollingState::new();

    for record in records.iter_mut() {
        if current_cell != Some(record.cell) {
            current_cell = Some(record.cell);
            state = RollingState::new();
        }

        record.history = state.features();
        state.push(f64::from(record.num_incidents), &record.vehicles);
    }

    log::debug!("Derived historical features for {} rows", records.len());
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use h3o::CellIndex;
    use via_segura_models::{HistoricalFeatures, VictimCounts};

    use super::*;

    fn cell_a() -> CellIndex {
        "8928308280fffff".parse().unwrap()
    }

    fn cell_b() -> CellIndex {
        "8928308280bffff".parse().unwrap()
    }

    fn record(cell: CellIndex, week: u32, incidents: u32, auto: u32) -> WeeklyCellRecord {
        let week_start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
            + chrono::Duration::weeks(i64::from(week) - 1);
        WeeklyCellRecord {
            cell,
            year_week: 2024 * 100 + i32::try_from(week).unwrap(),
            week_start,
            num_incidents: incidents,
            vehicles: VehicleCounts {
                auto,
                ..VehicleCounts::default()
            },
            victims: VictimCounts::default(),
            year: 2024,
            month: 1,
            holiday: false,
            weekend: false,
            latitude: Some(-8.05),
            longitude: Some(-34.9),
            bairro: "derby".to_string(),
            history: HistoricalFeatures::default(),
        }
    }

    #[test]
    fn worked_example_from_four_weeks_of_history() {
        // Weekly counts [2, 0, 3, 1]: the features a 5th week would see.
        let mut state = RollingState::new();
        for count in [2.0, 0.0, 3.0, 1.0] {
            state.push(count, &VehicleCounts::default());
        }

        let features = state.features();
        assert!((features.lag_1w - 1.0).abs() < f64::EPSILON);
        assert!((features.lag_4w - 2.0).abs() < f64::EPSILON);
        assert!((features.mean_4w - 1.5).abs() < f64::EPSILON);
        assert!((features.mean_12w - 1.5).abs() < f64::EPSILON);
        assert!((features.cumulative_total - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn first_row_of_a_cell_has_all_zero_features() {
        let mut records = vec![record(cell_a(), 1, 5, 2)];
        add_history(&mut records);
        assert_eq!(records[0].history, HistoricalFeatures::default());
    }

    #[test]
    fn second_row_mean_equals_the_single_prior_value() {
        let mut records = vec![record(cell_a(), 1, 4, 0), record(cell_a(), 2, 0, 0)];
        add_history(&mut records);

        let h = &records[1].history;
        assert!((h.lag_1w - 4.0).abs() < f64::EPSILON);
        assert!((h.mean_4w - 4.0).abs() < f64::EPSILON);
        assert!((h.mean_12w - 4.0).abs() < f64::EPSILON);
        // Four weeks back does not exist yet.
        assert!((h.lag_4w - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn windows_are_bounded_at_their_nominal_length() {
        let mut state = RollingState::new();
        for week in 0..20 {
            state.push(f64::from(week), &VehicleCounts::default());
        }

        let features = state.features();
        // mean_4w over [16, 17, 18, 19].
        assert!((features.mean_4w - 17.5).abs() < f64::EPSILON);
        // mean_12w over [8..=19].
        assert!((features.mean_12w - 13.5).abs() < f64::EPSILON);
        // lag_4w is the 4th most recent value.
        assert!((features.lag_4w - 16.0).abs() < f64::EPSILON);
        // Cumulative sum is unbounded: 0 + 1 + ... + 19.
        assert!((features.cumulative_total - 190.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cells_are_independent() {
        let mut records = vec![
            record(cell_a(), 1, 10, 1),
            record(cell_a(), 2, 0, 0),
            record(cell_b(), 1, 3, 0),
            record(cell_b(), 2, 0, 0),
        ];
        add_history(&mut records);

        let a2 = records
            .iter()
            .find(|r| r.cell == cell_a() && r.year_week == 2024_02)
            .unwrap();
        let b2 = records
            .iter()
            .find(|r| r.cell == cell_b() && r.year_week == 2024_02)
            .unwrap();
        assert!((a2.history.lag_1w - 10.0).abs() < f64::EPSILON);
        assert!((b2.history.lag_1w - 3.0).abs() < f64::EPSILON);
        assert!((a2.history.auto_hist - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn features_are_causal_under_future_mutation() {
        let mut base = vec![
            record(cell_a(), 1, 2, 0),
            record(cell_a(), 2, 0, 0),
            record(cell_a(), 3, 3, 0),
            record(cell_a(), 4, 1, 0),
        ];
        let mut mutated = base.clone();
        // Change only the final week's observation.
        mutated[3].num_incidents = 99;

        add_history(&mut base);
        add_history(&mut mutated);

        // Every row before the mutated week derives identical features.
        for (a, b) in base.iter().zip(&mutated).take(3) {
            assert_eq!(a.history, b.history);
        }
        // The mutated week itself also matches: its features only read
        // weeks 1-3.
        assert_eq!(base[3].history, mutated[3].history);
    }
}
