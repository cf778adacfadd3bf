#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Model feature assembly, training, and multi-step forecasting.
//!
//! The forecaster treats the trained model as a black box behind the
//! [`Predictor`] trait; [`poisson::PoissonRegressor`] is the regressor
//! shipped with the pipeline. [`autoregressive::forecast`] walks the
//! horizon week by week, feeding each week's predictions back into the
//! next week's lag and rolling features.

pub mod autoregressive;
pub mod features;
pub mod poisson;

use chrono::NaiveDate;
use h3o::CellIndex;
use thiserror::Error;

pub use autoregressive::{DEFAULT_HORIZON_WEEKS, forecast};
pub use features::{FEATURE_NAMES, FeatureRow, LabelEncoder};
pub use poisson::{PoissonConfig, PoissonRegressor, TrainError, TrainMetrics};

/// Boxed error type returned by [`Predictor`] implementations.
pub type ModelError = Box<dyn std::error::Error + Send + Sync>;

/// A trained model usable by the forecaster.
///
/// Implementations receive one feature row and return one raw
/// prediction. The forecaster clamps outputs at zero for export but
/// propagates the raw value into its working history.
pub trait Predictor {
    /// Predicts the weekly accident count for one feature row.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying model cannot evaluate the
    /// row; the forecast run is aborted rather than skipping the cell.
    fn predict(&self, row: &FeatureRow) -> Result<f64, ModelError>;
}

/// Error type for forecast runs.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// No historical rows were supplied.
    #[error("empty history; nothing to forecast")]
    EmptyHistory,

    /// The model failed to evaluate a feature row. Skipping the cell
    /// instead would desynchronize the dense grid for downstream
    /// export, so the whole run aborts.
    #[error("model prediction failed for cell {cell}, week {week_start}")]
    Model {
        /// Cell being predicted when the model failed.
        cell: CellIndex,
        /// Target week of the failed prediction.
        week_start: NaiveDate,
        /// Underlying model error.
        #[source]
        source: ModelError,
    },

    /// The model returned NaN or an infinity. Propagating it would
    /// poison every later step's features, so it is fatal.
    #[error("model produced a non-finite prediction for cell {cell}, week {week_start}")]
    NonFinitePrediction {
        /// Cell being predicted.
        cell: CellIndex,
        /// Target week of the non-finite prediction.
        week_start: NaiveDate,
    },
}
