#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Core data model for the accident forecasting pipeline.
//!
//! Defines the raw [`AccidentEvent`] record, the [`CellWeekKey`] that
//! identifies one weekly aggregation bucket, the dense-grid
//! [`WeeklyCellRecord`] row, and the terminal [`PredictionRecord`]
//! artifact. All row types are flat named-scalar structs so downstream
//! exporters can write them to tabular form without reshaping.

use chrono::NaiveDate;
use h3o::CellIndex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use via_segura_temporal::{iso_year_week, week_start};

/// Vehicle categories counted per incident in the raw CTTU export.
///
/// Serialized forms match the raw CSV column names.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VehicleCategory {
    /// Passenger cars
    Auto,
    /// Motorcycles
    Moto,
    /// Mopeds
    Ciclom,
    /// Bicycles
    Ciclista,
    /// Pedestrians involved
    Pedestre,
    /// Buses
    Onibus,
    /// Trucks
    Caminhao,
    /// Official/police vehicles
    Viatura,
    /// Anything else
    Outros,
}

impl VehicleCategory {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Auto,
            Self::Moto,
            Self::Ciclom,
            Self::Ciclista,
            Self::Pedestre,
            Self::Onibus,
            Self::Caminhao,
            Self::Viatura,
            Self::Outros,
        ]
    }
}

/// Per-incident vehicle involvement counts, one field per
/// [`VehicleCategory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleCounts {
    pub auto: u32,
    pub moto: u32,
    pub ciclom: u32,
    pub ciclista: u32,
    pub pedestre: u32,
    pub onibus: u32,
    pub caminhao: u32,
    pub viatura: u32,
    pub outros: u32,
}

impl VehicleCounts {
    /// Returns the count for one category.
    #[must_use]
    pub const fn get(&self, category: VehicleCategory) -> u32 {
        match category {
            VehicleCategory::Auto => self.auto,
            VehicleCategory::Moto => self.moto,
            VehicleCategory::Ciclom => self.ciclom,
            VehicleCategory::Ciclista => self.ciclista,
            VehicleCategory::Pedestre => self.pedestre,
            VehicleCategory::Onibus => self.onibus,
            VehicleCategory::Caminhao => self.caminhao,
            VehicleCategory::Viatura => self.viatura,
            VehicleCategory::Outros => self.outros,
        }
    }

    /// Adds `other` into `self`, category by category.
    pub fn accumulate(&mut self, other: &Self) {
        self.auto += other.auto;
        self.moto += other.moto;
        self.ciclom += other.ciclom;
        self.ciclista += other.ciclista;
        self.pedestre += other.pedestre;
        self.onibus += other.onibus;
        self.caminhao += other.caminhao;
        self.viatura += other.viatura;
        self.outros += other.outros;
    }
}

/// Per-incident victim counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictimCounts {
    /// Injured victims
    pub vitimas: u32,
    /// Fatalities
    pub vitimasfatais: u32,
}

impl VictimCounts {
    /// Adds `other` into `self`.
    pub fn accumulate(&mut self, other: &Self) {
        self.vitimas += other.vitimas;
        self.vitimasfatais += other.vitimasfatais;
    }
}

/// Sentinel used where a categorical value is missing or a group has no
/// usable observations.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// One raw incident record, immutable after ingestion.
///
/// Events without resolvable coordinates carry `cell = None` and are
/// discarded by the weekly aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccidentEvent {
    /// Date of the incident.
    pub date: NaiveDate,
    /// Hour of day (0..=23) when the time-of-day field parsed.
    pub hour: Option<u32>,
    /// H3 cell, when the event could be geocoded and cell-assigned.
    pub cell: Option<CellIndex>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Vehicle involvement counts.
    pub vehicles: VehicleCounts,
    /// Victim counts.
    pub victims: VictimCounts,
    /// Neighborhood (bairro), cleaned; `"unknown"` when absent.
    pub bairro: String,
    /// Street address, cleaned.
    pub endereco: String,
    /// The incident date is a holiday.
    pub holiday: bool,
    /// The incident date is a Saturday or Sunday.
    pub weekend: bool,
}

/// Composite key identifying one (cell, ISO week) aggregation bucket.
///
/// `week_start` is always the Monday of the ISO week encoded by
/// `year_week`; it is the canonical sortable time axis, while
/// `year_week` (`iso_year * 100 + iso_week`) is kept as a grouping
/// label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellWeekKey {
    pub cell: CellIndex,
    pub year_week: i32,
    pub week_start: NaiveDate,
}

impl CellWeekKey {
    /// Builds the key for the ISO week containing `date`.
    #[must_use]
    pub fn from_date(cell: CellIndex, date: NaiveDate) -> Self {
        Self {
            cell,
            year_week: iso_year_week(date),
            week_start: week_start(date),
        }
    }
}

/// Backward-looking features derived for one [`WeeklyCellRecord`].
///
/// Every value is computed from strictly-prior weeks of the same cell;
/// insufficient history yields 0.0 rather than a missing-data sentinel,
/// so early-life cells are indistinguishable from truly quiet ones.
/// Preserved behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalFeatures {
    /// Incident count one week earlier.
    pub lag_1w: f64,
    /// Incident count four weeks earlier.
    pub lag_4w: f64,
    /// Mean over up to 4 trailing weeks.
    pub mean_4w: f64,
    /// Mean over up to 12 trailing weeks.
    pub mean_12w: f64,
    /// Sum of all strictly-prior weekly counts for the cell.
    pub cumulative_total: f64,
    /// Cumulative `auto` involvement over prior weeks.
    pub auto_hist: f64,
    /// Cumulative `moto` involvement over prior weeks.
    pub moto_hist: f64,
    /// Cumulative `onibus` involvement over prior weeks.
    pub onibus_hist: f64,
    /// Cumulative `caminhao` involvement over prior weeks.
    pub caminhao_hist: f64,
}

/// One row of the dense (cell × week) grid.
///
/// For a fixed cell the set of records spans every globally observed
/// week with no gaps; weeks without observations are zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyCellRecord {
    pub cell: CellIndex,
    /// `iso_year * 100 + iso_week` grouping label.
    pub year_week: i32,
    /// Monday of the ISO week.
    pub week_start: NaiveDate,
    /// Number of incidents observed in this cell-week. Zero-filled for
    /// weeks without observations.
    pub num_incidents: u32,
    /// Summed vehicle involvement.
    pub vehicles: VehicleCounts,
    /// Summed victim counts.
    pub victims: VictimCounts,
    pub year: i32,
    pub month: u32,
    /// Any day of the week was a holiday.
    pub holiday: bool,
    /// Any observed event fell on a weekend day.
    pub weekend: bool,
    /// Representative latitude: first observation of the week, or the
    /// cell's long-run mean for zero-filled weeks.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Representative neighborhood (mode over the week, or the cell's
    /// long-run mode for zero-filled weeks).
    pub bairro: String,
    /// Derived backward-looking features.
    pub history: HistoricalFeatures,
}

impl WeeklyCellRecord {
    /// Returns the composite aggregation key of this row.
    #[must_use]
    pub const fn key(&self) -> CellWeekKey {
        CellWeekKey {
            cell: self.cell,
            year_week: self.year_week,
            week_start: self.week_start,
        }
    }
}

/// Terminal prediction artifact: one forecast value for one cell-week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub cell: CellIndex,
    /// Monday of the forecast target week.
    pub week_start: NaiveDate,
    /// Predicted accident count, clamped at zero.
    pub predicted_accidents: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> CellIndex {
        "8928308280fffff".parse().unwrap()
    }

    #[test]
    fn cell_week_key_aligns_to_monday() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 13).unwrap(); // Thursday
        let key = CellWeekKey::from_date(cell(), date);
        assert_eq!(key.week_start, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(key.year_week, 2024_24);
    }

    #[test]
    fn same_week_dates_share_a_key() {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();
        assert_eq!(
            CellWeekKey::from_date(cell(), monday),
            CellWeekKey::from_date(cell(), sunday)
        );
    }

    #[test]
    fn vehicle_counts_accumulate() {
        let mut acc = VehicleCounts::default();
        acc.accumulate(&VehicleCounts {
            auto: 1,
            moto: 2,
            ..VehicleCounts::default()
        });
        acc.accumulate(&VehicleCounts {
            auto: 2,
            onibus: 1,
            ..VehicleCounts::default()
        });
        assert_eq!(acc.auto, 3);
        assert_eq!(acc.moto, 2);
        assert_eq!(acc.onibus, 1);
        assert_eq!(acc.get(VehicleCategory::Auto), 3);
    }

    #[test]
    fn vehicle_category_column_names() {
        assert_eq!(VehicleCategory::Caminhao.to_string(), "caminhao");
        assert_eq!(VehicleCategory::all().len(), 9);
    }
}
