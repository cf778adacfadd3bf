//! L2-regularized Poisson regression with a log link.
//!
//! Weekly accident counts are non-negative and heavily zero-inflated,
//! so the trainer minimizes Poisson deviance rather than squared error.
//! Features are standardized internally; gradient descent on the
//! linear predictor converges quickly at this feature count.

use thiserror::Error;

use crate::features::FeatureRow;
use crate::{ModelError, Predictor};

/// Floor applied to predictions inside logarithms.
const DEVIANCE_EPS: f64 = 1e-9;

/// Clamp on the linear predictor to keep `exp` finite during training.
const LINK_CLAMP: f64 = 30.0;

/// Training error.
#[derive(Debug, Error)]
pub enum TrainError {
    /// No training rows were supplied.
    #[error("empty training set")]
    EmptyTrainingSet,

    /// Feature and target lengths differ.
    #[error("feature/target length mismatch: {rows} rows vs {targets} targets")]
    LengthMismatch {
        /// Number of feature rows.
        rows: usize,
        /// Number of target values.
        targets: usize,
    },
}

/// Hyperparameters for [`PoissonRegressor::fit`].
#[derive(Debug, Clone, Copy)]
pub struct PoissonConfig {
    /// L2 penalty on the weights.
    pub l2: f64,
    /// Gradient-descent step size.
    pub learning_rate: f64,
    /// Number of full-batch descent iterations.
    pub epochs: usize,
}

impl Default for PoissonConfig {
    fn default() -> Self {
        Self {
            l2: 1e-6,
            learning_rate: 0.05,
            epochs: 1000,
        }
    }
}

/// Fit quality metrics over a labeled dataset.
#[derive(Debug, Clone, Copy)]
pub struct TrainMetrics {
    /// Mean absolute error.
    pub mae: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// Mean Poisson deviance (lower is better).
    pub poisson_deviance: f64,
}

/// A fitted Poisson regression model.
///
/// Stores the standardization parameters learned at fit time so
/// prediction-time rows go through the identical transform.
#[derive(Debug, Clone)]
pub struct PoissonRegressor {
    weights: Vec<f64>,
    bias: f64,
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl PoissonRegressor {
    /// Fits the regressor by full-batch gradient descent.
    ///
    /// # Errors
    ///
    /// Returns an error if the training set is empty or rows and
    /// targets disagree in length.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(
        rows: &[FeatureRow],
        targets: &[f64],
        config: &PoissonConfig,
    ) -> Result<Self, TrainError> {
        if rows.is_empty() {
            return Err(TrainError::EmptyTrainingSet);
        }
        if rows.len() != targets.len() {
            return Err(TrainError::LengthMismatch {
                rows: rows.len(),
                targets: targets.len(),
            });
        }

        let matrix: Vec<Vec<f64>> = rows.iter().map(FeatureRow::to_vector).collect();
        let width = FeatureRow::WIDTH;
        let n = matrix.len() as f64;

        let mut means = vec![0.0; width];
        for row in &matrix {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut stds = vec![0.0; width];
        for row in &matrix {
            for ((std, value), mean) in stds.iter_mut().zip(row).zip(&means) {
                *std += (value - mean).powi(2);
            }
        }
        for std in &mut stds {
            *std = (*std / n).sqrt();
            // Constant columns carry no signal; a unit scale keeps them
            // harmlessly centered at zero.
            if *std < f64::EPSILON {
                *std = 1.0;
            }
        }

        let standardized: Vec<Vec<f64>> = matrix
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&means)
                    .zip(&stds)
                    .map(|((value, mean), std)| (value - mean) / std)
                    .collect()
            })
            .collect();

        let mean_target = targets.iter().sum::<f64>() / n;
        let mut weights = vec![0.0; width];
        let mut bias = mean_target.max(DEVIANCE_EPS).ln();

        for _ in 0..config.epochs {
            let mut weight_grad = vec![0.0; width];
            let mut bias_grad = 0.0;

            for (row, &target) in standardized.iter().zip(targets) {
                let eta = link(&weights, bias, row);
                let residual = eta.exp() - target;
                bias_grad += residual;
                for (grad, value) in weight_grad.iter_mut().zip(row) {
                    *grad += residual * value;
                }
            }

            for (weight, grad) in weights.iter_mut().zip(&weight_grad) {
                *weight -= config.learning_rate * (grad / n + config.l2 * *weight);
            }
            bias -= config.learning_rate * bias_grad / n;
        }

        Ok(Self {
            weights,
            bias,
            means,
            stds,
        })
    }

    /// Predicts the expected count for one row.
    #[must_use]
    pub fn predict_value(&self, row: &FeatureRow) -> f64 {
        let standardized: Vec<f64> = row
            .to_vector()
            .iter()
            .zip(&self.means)
            .zip(&self.stds)
            .map(|((value, mean), std)| (value - mean) / std)
            .collect();
        link(&self.weights, self.bias, &standardized).exp()
    }

    /// Evaluates fit quality over a labeled dataset.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn evaluate(&self, rows: &[FeatureRow], targets: &[f64]) -> TrainMetrics {
        let predictions: Vec<f64> = rows.iter().map(|row| self.predict_value(row)).collect();
        let n = predictions.len().max(1) as f64;

        let mae = predictions
            .iter()
            .zip(targets)
            .map(|(pred, target)| (pred - target).abs())
            .sum::<f64>()
            / n;
        let rmse = (predictions
            .iter()
            .zip(targets)
            .map(|(pred, target)| (pred - target).powi(2))
            .sum::<f64>()
            / n)
            .sqrt();

        TrainMetrics {
            mae,
            rmse,
            poisson_deviance: poisson_deviance(targets, &predictions),
        }
    }
}

impl Predictor for PoissonRegressor {
    fn predict(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        Ok(self.predict_value(row))
    }
}

fn link(weights: &[f64], bias: f64, row: &[f64]) -> f64 {
    let eta: f64 = bias
        + weights
            .iter()
            .zip(row)
            .map(|(weight, value)| weight * value)
            .sum::<f64>();
    eta.clamp(-LINK_CLAMP, LINK_CLAMP)
}

/// Mean Poisson deviance (lower is better).
///
/// Predictions are floored at a small epsilon before the logarithm;
/// the `y log(y/μ)` term is zero by convention when `y` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn poisson_deviance(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let n = y_true.len().max(1) as f64;
    let total: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&y, &pred)| {
            let pred = pred.max(DEVIANCE_EPS);
            let term = if y == 0.0 { 0.0 } else { y * (y / pred).ln() };
            term - (y - pred)
        })
        .sum();
    2.0 * total / n
}
