//! ISO-week alignment helpers for the weekly time axis.
//!
//! All weekly aggregation and forecasting keys on the Monday of the ISO
//! week, which gives a sortable, joinable date that supports offsetting
//! by whole weeks — unlike the raw `year * 100 + week` integer, which is
//! kept only as a display/grouping label.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Returns the Monday of `date`'s ISO week.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Returns the `iso_year * 100 + iso_week` label for `date`.
///
/// The ISO year is used rather than the calendar year so that the last
/// days of December belonging to week 1 of the next year label
/// consistently with their Monday.
#[must_use]
pub fn iso_year_week(date: NaiveDate) -> i32 {
    let iso = date.iso_week();
    iso.year() * 100 + i32::try_from(iso.week()).unwrap_or(0)
}

/// Offsets a date by `n` whole weeks (negative values step backward).
#[must_use]
pub fn add_weeks(date: NaiveDate, n: i64) -> NaiveDate {
    date + Duration::weeks(n)
}

/// Returns the calendar quarter (1..=4) of `date`.
#[must_use]
pub fn quarter(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Returns `true` for Saturday and Sunday.
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
