#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatio-temporal aggregation: from irregular accident events to a
//! dense, gap-free weekly time series per H3 cell.
//!
//! Three stages, in order:
//! 1. [`aggregate_weekly`] groups events into one sparse row per
//!    observed (cell, ISO week) bucket.
//! 2. [`complete_grid`] expands the sparse rows to the full cross
//!    product of observed cells × observed weeks, zero-filling the
//!    combinations without events. Without this step any trained model
//!    would only ever see nonzero weeks and be biased upward.
//! 3. [`add_history`] derives backward-looking lag/rolling features,
//!    using only strictly-prior weeks of the same cell.

pub mod grid;
pub mod history;
pub mod weekly;

use thiserror::Error;

pub use grid::complete_grid;
pub use history::{RollingState, add_history};
pub use weekly::{SparseWeekly, aggregate_weekly};

/// Error type for the aggregation pipeline.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// No event carried an H3 cell, so there is nothing to aggregate.
    /// Continuing would silently produce an empty forecast downstream.
    #[error("no events with a spatial cell assignment; cannot aggregate")]
    NoSpatialData,
}
