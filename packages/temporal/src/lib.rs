#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Calendar arithmetic and temporal feature primitives.
//!
//! Provides the cyclic sine/cosine encodings used as model inputs, the
//! ISO-week / Monday-alignment helpers that define the weekly time axis,
//! and the Brazilian holiday calendar (national fixed dates, Recife
//! municipal dates, and Easter-derived movable feasts).

pub mod cyclic;
pub mod holidays;
pub mod week;

pub use cyclic::encode_cyclic;
pub use holidays::HolidayCalendar;
pub use week::{add_weeks, iso_year_week, is_weekend, quarter, week_start};
