//! ML ensemble: trains both classifiers, averages their inference outputs

use crate::config::TrainingConfig;
use crate::error::{FraudError, Result};
use crate::feature_extractor::FeatureExtractor;
use crate::models::forest::{RandomForestClassifier, TreeNode};
use crate::models::logistic::{LogisticClassifier, TrainingReport};
use crate::types::result::RiskLevel;
use crate::types::transaction::{Transaction, TransactionStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Outcome of training both models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub logistic: TrainingReport,
    pub forest_trees: usize,
    pub total_samples: usize,
}

/// Averaged prediction of both models for one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlPrediction {
    pub transaction_id: String,
    pub logistic_score: f64,
    pub forest_score: f64,
    /// Mean of the two model scores, in [0, 1].
    pub ensemble_score: f64,
    pub risk_level: RiskLevel,
}

/// Serialized model state. Field layout is the on-disk contract.
#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    logistic: LogisticState,
    forest: ForestState,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LogisticState {
    weights: Vec<f64>,
    bias: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ForestState {
    trees: Vec<TreeNode>,
}

/// Trains a logistic classifier and a random forest on labeled transactions
/// and averages their predictions.
///
/// `train` is an exclusive operation on the instance; inference is read-only
/// once training has completed.
pub struct MlEnsemble {
    logistic: LogisticClassifier,
    forest: RandomForestClassifier,
    training: TrainingConfig,
    trained: bool,
}

impl MlEnsemble {
    pub fn new() -> Self {
        Self::with_config(TrainingConfig::default())
    }

    pub fn with_config(training: TrainingConfig) -> Self {
        let forest = match training.seed {
            Some(seed) => {
                RandomForestClassifier::with_seed(training.num_trees, training.max_depth, seed)
            }
            None => RandomForestClassifier::new(training.num_trees, training.max_depth),
        };
        Self {
            logistic: LogisticClassifier::new(),
            forest,
            training,
            trained: false,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Train both models on an ordered labeled sample set.
    ///
    /// Sample order is preserved through feature extraction into the
    /// stochastic gradient loop, so identical inputs reproduce identical
    /// logistic weights.
    pub fn train(
        &mut self,
        store: &TransactionStore,
        samples: &[(Transaction, u8)],
    ) -> Result<TrainingSummary> {
        if samples.is_empty() {
            return Err(FraudError::Training("no training data".to_string()));
        }

        let extractor = FeatureExtractor::new(store);
        let mut features = Vec::with_capacity(samples.len());
        let mut labels = Vec::with_capacity(samples.len());
        for (transaction, label) in samples {
            features.push(extractor.extract(transaction).to_vec());
            labels.push(*label);
        }

        let logistic = self.logistic.train(
            &features,
            &labels,
            self.training.learning_rate,
            self.training.epochs,
        )?;
        let forest_trees = self.forest.train(&features, &labels)?;

        self.trained = true;
        info!(
            total_samples = samples.len(),
            epochs_trained = logistic.epochs_trained,
            forest_trees,
            "ML ensemble trained"
        );

        Ok(TrainingSummary {
            logistic,
            forest_trees,
            total_samples: samples.len(),
        })
    }

    /// Score a transaction with both models and average.
    ///
    /// Fails with [`FraudError::NotTrained`] before the first successful
    /// `train` or `load`, so callers can tell "never trained" apart from a
    /// trained model's neutral 0.5.
    pub fn predict(
        &self,
        store: &TransactionStore,
        transaction: &Transaction,
    ) -> Result<MlPrediction> {
        if !self.trained {
            return Err(FraudError::NotTrained);
        }

        let features = FeatureExtractor::new(store).extract(transaction).to_vec();
        let logistic_score = self.logistic.predict(&features);
        let forest_score = self.forest.predict(&features);
        let ensemble_score = (logistic_score + forest_score) / 2.0;

        Ok(MlPrediction {
            transaction_id: transaction.transaction_id.clone(),
            logistic_score,
            forest_score,
            ensemble_score,
            risk_level: RiskLevel::from_ensemble_score(ensemble_score),
        })
    }

    /// Persist the trained model state as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = ModelFile {
            logistic: LogisticState {
                weights: self.logistic.weights().to_vec(),
                bias: self.logistic.bias(),
            },
            forest: ForestState {
                trees: self.forest.trees().to_vec(),
            },
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| FraudError::ModelFormat(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load persisted model state, replacing both models.
    ///
    /// The file is fully deserialized before any state is committed; a
    /// malformed file leaves the in-memory models untouched.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let raw = std::fs::read_to_string(path)?;
        let file: ModelFile =
            serde_json::from_str(&raw).map_err(|e| FraudError::ModelFormat(e.to_string()))?;

        self.logistic
            .set_parameters(file.logistic.weights, file.logistic.bias);
        self.forest.set_trees(file.forest.trees);
        self.trained = true;
        Ok(())
    }
}

impl Default for MlEnsemble {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::{Location, MerchantCategory, TransactionType};
    use chrono::{Duration, TimeZone};

    fn tx(id: &str, amount: f64, offset_hours: i64) -> Transaction {
        let base = Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap();
        Transaction {
            transaction_id: id.to_string(),
            cardholder_id: "ch_1".to_string(),
            amount,
            timestamp: base + Duration::hours(offset_hours),
            merchant_name: "Safeway".to_string(),
            merchant_category: MerchantCategory::Grocery,
            transaction_type: TransactionType::Purchase,
            location: Location {
                latitude: 40.7128,
                longitude: -74.0060,
            },
            mcc_code: "5411".to_string(),
            country: "USA".to_string(),
            is_fraud: false,
        }
    }

    fn training_samples() -> (TransactionStore, Vec<(Transaction, u8)>) {
        let mut store = TransactionStore::new();
        for i in 0..10 {
            store.add(tx(&format!("h{i}"), 50.0 + i as f64, i as i64 * 24));
        }

        let mut samples = Vec::new();
        for i in 0..10 {
            samples.push((tx(&format!("n{i}"), 55.0, 300 + i), 0));
            samples.push((tx(&format!("f{i}"), 5000.0 + i as f64 * 10.0, 300 + i), 1));
        }
        (store, samples)
    }

    #[test]
    fn test_untrained_predict_is_an_error() {
        let store = TransactionStore::new();
        let ensemble = MlEnsemble::new();
        assert!(matches!(
            ensemble.predict(&store, &tx("probe", 100.0, 0)),
            Err(FraudError::NotTrained)
        ));
    }

    #[test]
    fn test_train_then_predict() {
        let (store, samples) = training_samples();

        let mut config = TrainingConfig::default();
        config.seed = Some(9);
        let mut ensemble = MlEnsemble::with_config(config);

        let summary = ensemble.train(&store, &samples).unwrap();
        assert_eq!(summary.total_samples, 20);
        assert_eq!(summary.forest_trees, 10);
        assert!(summary.logistic.epochs_trained >= 1);

        let prediction = ensemble.predict(&store, &tx("probe", 6000.0, 400)).unwrap();
        assert!((0.0..=1.0).contains(&prediction.ensemble_score));
        assert_eq!(
            prediction.ensemble_score,
            (prediction.logistic_score + prediction.forest_score) / 2.0
        );
    }

    #[test]
    fn test_empty_training_set() {
        let store = TransactionStore::new();
        let mut ensemble = MlEnsemble::new();
        assert!(matches!(
            ensemble.train(&store, &[]),
            Err(FraudError::Training(_))
        ));
        assert!(!ensemble.is_trained());
    }

    #[test]
    fn test_save_load_round_trip() {
        let (store, samples) = training_samples();

        let mut config = TrainingConfig::default();
        config.seed = Some(9);
        let mut ensemble = MlEnsemble::with_config(config);
        ensemble.train(&store, &samples).unwrap();

        let probe = tx("probe", 6000.0, 400);
        let before = ensemble.predict(&store, &probe).unwrap();

        let path = std::env::temp_dir().join(format!("fraud_model_{}.json", std::process::id()));
        ensemble.save(&path).unwrap();

        let mut reloaded = MlEnsemble::new();
        reloaded.load(&path).unwrap();
        let after = reloaded.predict(&store, &probe).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(before.logistic_score, after.logistic_score);
        assert_eq!(before.forest_score, after.forest_score);
        assert_eq!(before.ensemble_score, after.ensemble_score);
    }

    #[test]
    fn test_load_failures_are_distinct() {
        let mut ensemble = MlEnsemble::new();

        let missing = std::env::temp_dir().join("no_such_fraud_model.json");
        assert!(matches!(ensemble.load(&missing), Err(FraudError::Io(_))));

        let path = std::env::temp_dir().join(format!("bad_model_{}.json", std::process::id()));
        std::fs::write(&path, "{\"logistic\": 17}").unwrap();
        assert!(matches!(
            ensemble.load(&path),
            Err(FraudError::ModelFormat(_))
        ));
        std::fs::remove_file(&path).ok();

        // Failed loads leave the model untrained.
        assert!(!ensemble.is_trained());
    }

    #[test]
    fn test_model_file_layout() {
        let (store, samples) = training_samples();
        let mut config = TrainingConfig::default();
        config.seed = Some(9);
        let mut ensemble = MlEnsemble::with_config(config);
        ensemble.train(&store, &samples).unwrap();

        let path = std::env::temp_dir().join(format!("layout_model_{}.json", std::process::id()));
        ensemble.save(&path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["logistic"]["weights"].is_array());
        assert!(value["logistic"]["bias"].is_number());
        assert!(value["forest"]["trees"].is_array());
        let first = &value["forest"]["trees"][0];
        assert!(first["type"] == "leaf" || first["type"] == "node");
    }
}
