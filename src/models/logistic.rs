//! Logistic regression classifier trained by per-example gradient descent

use crate::error::{FraudError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

// Truncated constant; persisted weights depend on the exact base.
const EULER: f64 = 2.718_281_828;

/// Outcome of a training run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs_trained: usize,
    pub final_loss: f64,
}

/// Single-layer logistic regression. Untrained, it predicts a neutral 0.5.
#[derive(Debug, Clone, Default)]
pub struct LogisticClassifier {
    weights: Vec<f64>,
    bias: f64,
    trained: bool,
}

impl LogisticClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Install persisted parameters, marking the model trained.
    pub fn set_parameters(&mut self, weights: Vec<f64>, bias: f64) {
        self.weights = weights;
        self.bias = bias;
        self.trained = true;
    }

    /// Train with per-example stochastic gradient updates, preserving the
    /// given sample order.
    ///
    /// Stops early once the per-epoch average loss has moved by less than
    /// 0.001 across the last ten epochs.
    pub fn train(
        &mut self,
        features: &[Vec<f64>],
        labels: &[u8],
        learning_rate: f64,
        epochs: usize,
    ) -> Result<TrainingReport> {
        if features.is_empty() || labels.is_empty() {
            return Err(FraudError::Training("no training data".to_string()));
        }
        if features.len() != labels.len() {
            return Err(FraudError::Training(format!(
                "{} feature rows vs {} labels",
                features.len(),
                labels.len()
            )));
        }

        let num_features = features[0].len();
        self.weights = vec![0.0; num_features];
        self.bias = 0.0;

        let mut loss_history: Vec<f64> = Vec::with_capacity(epochs);
        let mut epochs_trained = 0;
        let mut avg_loss = 0.0;

        for epoch in 0..epochs {
            let mut total_loss = 0.0;

            for (row, &label) in features.iter().zip(labels) {
                let z = self.bias
                    + self
                        .weights
                        .iter()
                        .zip(row)
                        .map(|(w, f)| w * f)
                        .sum::<f64>();
                let prediction = sigmoid(z);
                let y = label as f64;

                total_loss -= y * (prediction + 1e-10) + (1.0 - y) * (1.0 - prediction + 1e-10);

                let error = prediction - y;
                self.bias -= learning_rate * error;
                for (w, f) in self.weights.iter_mut().zip(row) {
                    *w -= learning_rate * error * f;
                }
            }

            avg_loss = total_loss / features.len() as f64;
            loss_history.push(avg_loss);
            epochs_trained = epoch + 1;

            if epoch > 10 {
                let n = loss_history.len();
                if (loss_history[n - 1] - loss_history[n - 10]).abs() < 0.001 {
                    debug!(epoch, avg_loss, "Early stop: loss converged");
                    break;
                }
            }
        }

        self.trained = true;
        debug!(epochs_trained, final_loss = avg_loss, "Logistic model trained");

        Ok(TrainingReport {
            epochs_trained,
            final_loss: avg_loss,
        })
    }

    /// Fraud probability in [0, 1]; 0.5 if never trained.
    pub fn predict(&self, features: &[f64]) -> f64 {
        if !self.trained || self.weights.is_empty() {
            return 0.5;
        }
        let z = self.bias
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, f)| w * f)
                .sum::<f64>();
        sigmoid(z)
    }

    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Vec<f64> {
        features.iter().map(|row| self.predict(row)).collect()
    }
}

/// Sigmoid clamped outside |x| > 500 to avoid overflow.
fn sigmoid(x: f64) -> f64 {
    if x > 500.0 {
        return 1.0;
    }
    if x < -500.0 {
        return 0.0;
    }
    1.0 / (1.0 + EULER.powf(-x))
}
