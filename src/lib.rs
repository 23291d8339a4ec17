//! Fraud Scoring Engine
//!
//! Scores payment transactions for fraud risk by combining rule-based
//! anomaly checks over a cardholder's history with a trainable ML ensemble
//! (logistic regression plus a random forest), then maps the score to a
//! risk tier and an action recommendation.

pub mod config;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod feature_extractor;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use engine::ScoringEngine;
pub use error::{FraudError, Result};
pub use feature_extractor::{FeatureExtractor, TransactionFeatures};
pub use models::ensemble::MlEnsemble;
pub use types::result::{FraudAnalysisResult, RiskLevel};
pub use types::transaction::{Transaction, TransactionStore};
