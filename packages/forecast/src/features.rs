//! Feature row assembly for training and forecasting.
//!
//! One [`FeatureRow`] per (cell, week): calendar components, cyclic
//! encodings, the backward-looking history features, and the encoded
//! neighborhood label. [`FEATURE_NAMES`] fixes the column order used
//! when rows are flattened to vectors.

use std::collections::BTreeMap;

use chrono::{Datelike as _, NaiveDate};
use via_segura_models::{HistoricalFeatures, WeeklyCellRecord};
use via_segura_temporal::cyclic::{MONTH_PERIOD, WEEK_OF_YEAR_PERIOD};
use via_segura_temporal::{HolidayCalendar, encode_cyclic};

/// Model feature columns, in vector order.
pub const FEATURE_NAMES: &[&str] = &[
    "year",
    "month",
    "week_of_year",
    "holiday",
    "weekend",
    "month_sin",
    "month_cos",
    "week_sin",
    "week_cos",
    "sinistros_media_4w",
    "sinistros_media_12w",
    "sinistros_lag_1w",
    "sinistros_lag_4w",
    "total_historico_celula",
    "auto_historico",
    "moto_historico",
    "onibus_historico",
    "caminhao_historico",
    "bairro_encoded",
];

/// One assembled model input row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    pub year: f64,
    pub month: f64,
    pub week_of_year: f64,
    pub holiday: f64,
    pub weekend: f64,
    pub month_sin: f64,
    pub month_cos: f64,
    pub week_sin: f64,
    pub week_cos: f64,
    pub mean_4w: f64,
    pub mean_12w: f64,
    pub lag_1w: f64,
    pub lag_4w: f64,
    pub cell_total: f64,
    pub auto_hist: f64,
    pub moto_hist: f64,
    pub onibus_hist: f64,
    pub caminhao_hist: f64,
    pub bairro_encoded: f64,
}

impl FeatureRow {
    /// Number of feature columns.
    pub const WIDTH: usize = FEATURE_NAMES.len();

    /// Flattens the row into a vector ordered as [`FEATURE_NAMES`].
    #[must_use]
    pub fn to_vector(&self) -> Vec<f64> {
        vec![
            self.year,
            self.month,
            self.week_of_year,
            self.holiday,
            self.weekend,
            self.month_sin,
            self.month_cos,
            self.week_sin,
            self.week_cos,
            self.mean_4w,
            self.mean_12w,
            self.lag_1w,
            self.lag_4w,
            self.cell_total,
            self.auto_hist,
            self.moto_hist,
            self.onibus_hist,
            self.caminhao_hist,
            self.bairro_encoded,
        ]
    }
}

/// Deterministic label encoding for categorical columns.
///
/// Classes are the sorted distinct values seen at fit time, mapped to
/// consecutive integers. Unseen values encode to 0.0 — forecast-time
/// bairros always come from the fitted grid, so this is a defensive
/// fallback only.
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    classes: BTreeMap<String, usize>,
}

impl LabelEncoder {
    /// Fits the encoder over an iterator of raw values.
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let distinct: std::collections::BTreeSet<&str> = values.into_iter().collect();
        Self {
            classes: distinct
                .into_iter()
                .enumerate()
                .map(|(index, value)| (value.to_string(), index))
                .collect(),
        }
    }

    /// Encodes one value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn encode(&self, value: &str) -> f64 {
        self.classes.get(value).copied().unwrap_or(0) as f64
    }

    /// Number of distinct classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if the encoder saw no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Builds the training feature row for one dense-grid record.
#[must_use]
pub fn from_record(record: &WeeklyCellRecord, encoder: &LabelEncoder) -> FeatureRow {
    let week_of_year = f64::from(record.year_week.rem_euclid(100));
    let (month_sin, month_cos) = encode_cyclic(f64::from(record.month), MONTH_PERIOD);
    let (week_sin, week_cos) = encode_cyclic(week_of_year, WEEK_OF_YEAR_PERIOD);

    FeatureRow {
        year: f64::from(record.year),
        month: f64::from(record.month),
        week_of_year,
        holiday: f64::from(u8::from(record.holiday)),
        weekend: f64::from(u8::from(record.weekend)),
        month_sin,
        month_cos,
        week_sin,
        week_cos,
        mean_4w: record.history.mean_4w,
        mean_12w: record.history.mean_12w,
        lag_1w: record.history.lag_1w,
        lag_4w: record.history.lag_4w,
        cell_total: record.history.cumulative_total,
        auto_hist: record.history.auto_hist,
        moto_hist: record.history.moto_hist,
        onibus_hist: record.history.onibus_hist,
        caminhao_hist: record.history.caminhao_hist,
        bairro_encoded: encoder.encode(&record.bairro),
    }
}

/// Builds the feature row for a synthetic forecast week.
///
/// Calendar components derive from `week_start` itself; the holiday
/// flag is the max over the week's seven days, matching the reduction
/// applied to observed weeks. The weekend flag is always set — every
/// full week contains a weekend.
#[must_use]
pub fn for_future_week(
    week_start: NaiveDate,
    history: &HistoricalFeatures,
    calendar: &HolidayCalendar,
    bairro_encoded: f64,
) -> FeatureRow {
    let iso = week_start.iso_week();
    let week_of_year = f64::from(iso.week());
    let (month_sin, month_cos) = encode_cyclic(f64::from(week_start.month()), MONTH_PERIOD);
    let (week_sin, week_cos) = encode_cyclic(week_of_year, WEEK_OF_YEAR_PERIOD);

    FeatureRow {
        year: f64::from(week_start.year()),
        month: f64::from(week_start.month()),
        week_of_year,
        holiday: f64::from(u8::from(calendar.is_holiday_week(week_start))),
        weekend: 1.0,
        month_sin,
        month_cos,
        week_sin,
        week_cos,
        mean_4w: history.mean_4w,
        mean_12w: history.mean_12w,
        lag_1w: history.lag_1w,
        lag_4w: history.lag_4w,
        cell_total: history.cumulative_total,
        auto_hist: history.auto_hist,
        moto_hist: history.moto_hist,
        onibus_hist: history.onibus_hist,
        caminhao_hist: history.caminhao_hist,
        bairro_encoded,
    }
}
