//! Sine/cosine encoding of bounded periodic values.
//!
//! Periodic calendar components (day of week, month, ...) are mapped onto
//! the unit circle so that adjacent values stay adjacent across the wrap
//! point (hour 23 -> 0, December -> January).

use std::f64::consts::PI;

/// Period for day-of-week encodings (Monday = 0 .. Sunday = 6).
pub const DAY_OF_WEEK_PERIOD: f64 = 7.0;

/// Period for month-of-year encodings (1..=12).
pub const MONTH_PERIOD: f64 = 12.0;

/// Period for day-of-year encodings. 365 regardless of leap years.
pub const DAY_OF_YEAR_PERIOD: f64 = 365.0;

/// Period for hour-of-day encodings (0..=23).
pub const HOUR_PERIOD: f64 = 24.0;

/// Period for ISO week-of-year encodings.
///
/// 52 even though some ISO years have 53 weeks; the small discontinuity
/// at year end is accepted.
pub const WEEK_OF_YEAR_PERIOD: f64 = 52.0;

/// Maps a periodic value onto the unit circle.
///
/// Returns `(sin, cos)` of `2π · value / period`.
#[must_use]
pub fn encode_cyclic(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn zero_maps_to_origin_of_circle() {
        let (sin, cos) = encode_cyclic(0.0, DAY_OF_WEEK_PERIOD);
        assert_close(sin, 0.0);
        assert_close(cos, 1.0);
    }

    #[test]
    fn quarter_period_maps_to_top_of_circle() {
        let (sin, cos) = encode_cyclic(6.0, HOUR_PERIOD);
        assert_close(sin, 1.0);
        assert_close(cos, 0.0);
    }

    #[test]
    fn full_period_wraps_to_start() {
        let (sin0, cos0) = encode_cyclic(0.0, MONTH_PERIOD);
        let (sin12, cos12) = encode_cyclic(12.0, MONTH_PERIOD);
        assert_close(sin12, sin0);
        assert_close(cos12, cos0);
    }

    #[test]
    fn adjacent_values_stay_adjacent_across_wrap() {
        // Hour 23 and hour 0 must be closer on the circle than hour 23
        // and hour 12.
        let p23 = encode_cyclic(23.0, HOUR_PERIOD);
        let p0 = encode_cyclic(0.0, HOUR_PERIOD);
        let p12 = encode_cyclic(12.0, HOUR_PERIOD);

        let dist = |a: (f64, f64), b: (f64, f64)| ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
        assert!(dist(p23, p0) < dist(p23, p12));
    }

    #[test]
    fn week_period_is_52_even_for_53_week_years() {
        // Week 53 encodes just past week 52's wrap point instead of
        // coinciding with week 1. Preserved behavior.
        let (sin53, _) = encode_cyclic(53.0, WEEK_OF_YEAR_PERIOD);
        let (sin1, _) = encode_cyclic(1.0, WEEK_OF_YEAR_PERIOD);
        assert!((sin53 - sin1).abs() > 1e-6);
    }
}
