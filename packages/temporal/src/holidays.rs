//! Brazilian holiday calendar for Recife.
//!
//! Combines national fixed-date holidays, Recife municipal holidays, and
//! the Easter-derived movable feasts (Carnival, Good Friday). Dates are
//! materialized per year into a lookup set at construction time.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use chrono::{Datelike, Duration, NaiveDate};

/// National fixed-date holidays as `(month, day)` pairs.
const NATIONAL_HOLIDAYS: &[(u32, u32)] = &[
    (1, 1),   // Confraternização Universal
    (4, 21),  // Tiradentes
    (5, 1),   // Dia do Trabalho
    (9, 7),   // Independência
    (10, 12), // Nossa Senhora Aparecida
    (11, 2),  // Finados
    (11, 15), // Proclamação da República
    (12, 25), // Natal
];

/// Recife municipal holidays as `(month, day)` pairs.
const MUNICIPAL_HOLIDAYS: &[(u32, u32)] = &[
    (6, 24),  // São João
    (7, 16),  // Nossa Senhora do Carmo
    (12, 8),  // Nossa Senhora da Conceição
];

/// Offset in days from Easter Sunday to Carnival Tuesday.
const CARNIVAL_OFFSET_DAYS: i64 = -47;

/// Offset in days from Easter Sunday to Good Friday.
const GOOD_FRIDAY_OFFSET_DAYS: i64 = -2;

/// Materialized holiday lookup covering a fixed span of years.
///
/// Built once over the years present in the dataset (plus the forecast
/// horizon) and shared read-only by the aggregation and forecasting
/// stages.
#[derive(Debug, Clone)]
pub struct HolidayCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Builds the calendar for every year in `years`.
    #[must_use]
    pub fn for_years(years: RangeInclusive<i32>) -> Self {
        let mut dates = BTreeSet::new();

        for year in years {
            for &(month, day) in NATIONAL_HOLIDAYS.iter().chain(MUNICIPAL_HOLIDAYS) {
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    dates.insert(date);
                }
            }

            let easter = easter_sunday(year);
            dates.insert(easter + Duration::days(CARNIVAL_OFFSET_DAYS));
            dates.insert(easter + Duration::days(GOOD_FRIDAY_OFFSET_DAYS));
        }

        Self { dates }
    }

    /// Returns `true` if `date` is a holiday.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// Returns `true` if any day of the week starting at `monday` is a
    /// holiday.
    ///
    /// Mirrors the max-over-week reduction applied to observed events, so
    /// synthetic forecast weeks get the same flag semantics.
    #[must_use]
    pub fn is_holiday_week(&self, monday: NaiveDate) -> bool {
        (0..7).any(|offset| self.contains(monday + Duration::days(offset)))
    }

    /// Number of materialized holiday dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns `true` if no dates are materialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Easter Sunday for `year`, via the anonymous Gregorian computus.
///
/// # Panics
///
/// Panics if the computed month/day pair is invalid, which cannot happen
/// for the algorithm's output range (March 22 – April 25).
#[must_use]
pub fn easter_sunday(year: i32) -> NaiveDate {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;

    NaiveDate::from_ymd_opt(year, u32::try_from(month).unwrap_or(3), u32::try_from(day).unwrap_or(22))
        .expect("computus produces a valid March/April date")
}
