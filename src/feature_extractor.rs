//! Feature extraction for ML fraud scoring.
//!
//! Transforms a transaction plus its cardholder's history into the fixed
//! 15-dimension vector the classifiers are trained against. The ordering of
//! [`TransactionFeatures::to_vec`] is part of the model contract.

use crate::config::DetectorThresholds;
use crate::detectors::{GeographicAnalyzer, VelocityChecker};
use crate::types::transaction::{Transaction, TransactionStore};
use chrono::{Datelike, Duration, Timelike};

/// Number of features produced per transaction.
pub const FEATURE_COUNT: usize = 15;

/// Features extracted from a transaction for ML scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFeatures {
    pub amount: f64,
    pub hour_of_day: u32,
    /// 0 = Monday .. 6 = Sunday.
    pub day_of_week: u32,
    pub is_weekend: bool,
    /// Deviation from the historical mean in units of half the mean
    /// (floored at 1), not a true z-score.
    pub amount_zscore: f64,
    pub days_since_last_transaction: f64,
    pub transactions_today: usize,
    pub transactions_this_week: usize,
    pub is_new_merchant: bool,
    pub is_new_category: bool,
    pub impossible_travel_score: f64,
    pub is_new_country: bool,
    pub category_frequency: f64,
    pub merchant_frequency: f64,
    pub rapid_transaction_count: usize,
}

impl TransactionFeatures {
    /// Flatten into the model input vector. Order is fixed.
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.amount,
            self.hour_of_day as f64,
            self.day_of_week as f64,
            self.is_weekend as u8 as f64,
            self.amount_zscore,
            self.days_since_last_transaction,
            self.transactions_today as f64,
            self.transactions_this_week as f64,
            self.is_new_merchant as u8 as f64,
            self.is_new_category as u8 as f64,
            self.impossible_travel_score,
            self.is_new_country as u8 as f64,
            self.category_frequency,
            self.merchant_frequency,
            self.rapid_transaction_count as f64,
        ]
    }
}

/// Extracts model features from transactions against a history store.
pub struct FeatureExtractor<'a> {
    store: &'a TransactionStore,
    thresholds: DetectorThresholds,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(store: &'a TransactionStore) -> Self {
        Self::with_thresholds(store, DetectorThresholds::default())
    }

    pub fn with_thresholds(store: &'a TransactionStore, thresholds: DetectorThresholds) -> Self {
        Self { store, thresholds }
    }

    /// Extract features for a transaction; history is read as-is, without
    /// the transaction itself.
    pub fn extract(&self, transaction: &Transaction) -> TransactionFeatures {
        let cardholder = transaction.cardholder_id.as_str();
        let history = self.store.by_cardholder(cardholder);

        let amount_zscore = if history.is_empty() {
            0.0
        } else {
            let avg = history.iter().map(|t| t.amount).sum::<f64>() / history.len() as f64;
            (transaction.amount - avg) / (avg * 0.5).max(1.0)
        };

        let hour_of_day = transaction.timestamp.hour();
        let day_of_week = transaction.timestamp.weekday().num_days_from_monday();
        let is_weekend = day_of_week >= 5;

        // Floored, so a transaction 1.5 days before its newest history
        // entry counts as -2 days, not -1.
        let days_since_last_transaction = history
            .iter()
            .max_by_key(|t| t.timestamp)
            .map(|last| {
                let delta = transaction.timestamp - last.timestamp;
                (delta.num_milliseconds() as f64 / 86_400_000.0).floor()
            })
            .unwrap_or(0.0);

        let today = transaction.timestamp.date_naive();
        let transactions_today = history
            .iter()
            .filter(|t| t.timestamp.date_naive() == today)
            .count();

        let week_ago = transaction.timestamp - Duration::days(7);
        let transactions_this_week = history
            .iter()
            .filter(|t| t.timestamp >= week_ago)
            .count();

        let merchant_count = history
            .iter()
            .filter(|t| t.merchant_name == transaction.merchant_name)
            .count();
        let is_new_merchant = merchant_count == 0;
        let merchant_frequency = merchant_count as f64 / history.len().max(1) as f64;

        let category_count = history
            .iter()
            .filter(|t| t.merchant_category == transaction.merchant_category)
            .count();
        let is_new_category = category_count == 0;
        let category_frequency = category_count as f64 / history.len().max(1) as f64;

        let geographic = GeographicAnalyzer::new(self.store, self.thresholds);
        let (travel, _) = geographic.impossible_travel(
            cardholder,
            &transaction.location,
            transaction.timestamp,
        );

        let is_new_country = !history.iter().any(|t| t.country == transaction.country);

        let velocity = VelocityChecker::new(self.store, self.thresholds);
        let (_, rapid_transaction_count) = velocity.rapid_transactions(cardholder);

        TransactionFeatures {
            amount: transaction.amount,
            hour_of_day,
            day_of_week,
            is_weekend,
            amount_zscore,
            days_since_last_transaction,
            transactions_today,
            transactions_this_week,
            is_new_merchant,
            is_new_category,
            impossible_travel_score: travel.confidence,
            is_new_country,
            category_frequency,
            merchant_frequency,
            rapid_transaction_count,
        }
    }

    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Feature names in vector order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        vec![
            "amount",
            "hour_of_day",
            "day_of_week",
            "is_weekend",
            "amount_zscore",
            "days_since_last_transaction",
            "transactions_today",
            "transactions_this_week",
            "is_new_merchant",
            "is_new_category",
            "impossible_travel_score",
            "new_country",
            "category_frequency",
            "merchant_frequency",
            "rapid_transaction_count",
        ]
    }
}
