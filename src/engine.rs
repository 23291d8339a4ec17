//! Rule-based scoring engine
//!
//! Runs all eight indicators against a transaction, combines their
//! confidences into a weighted fraud score, classifies the risk tier and
//! emits an action recommendation.

use crate::config::{DetectionConfig, DetectorThresholds, IndicatorWeights};
use crate::detectors::{AnomalyDetector, BehavioralAnalyzer, GeographicAnalyzer, VelocityChecker};
use crate::types::result::{
    AnalysisDetails, FraudAnalysisResult, IndicatorResult, RiskLevel, RiskLevelThresholds,
};
use crate::types::transaction::{Transaction, TransactionStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Scores transactions against a frozen history snapshot.
///
/// The engine never mutates the store; whether an analyzed transaction is
/// subsequently appended is the caller's decision.
pub struct ScoringEngine<'a> {
    store: &'a TransactionStore,
    weights: IndicatorWeights,
    thresholds: DetectorThresholds,
    risk_levels: RiskLevelThresholds,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(store: &'a TransactionStore) -> Self {
        Self::with_config(store, &DetectionConfig::default())
    }

    pub fn with_config(store: &'a TransactionStore, config: &DetectionConfig) -> Self {
        Self {
            store,
            weights: config.weights,
            thresholds: config.thresholds,
            risk_levels: config.risk_levels,
        }
    }

    /// Run the full rule analysis for one transaction.
    pub fn analyze(&self, transaction: &Transaction) -> FraudAnalysisResult {
        let anomaly = AnomalyDetector::new(self.store, self.thresholds);
        let velocity = VelocityChecker::new(self.store, self.thresholds);
        let geographic = GeographicAnalyzer::new(self.store, self.thresholds);
        let behavioral = BehavioralAnalyzer::new(self.store, self.thresholds);

        let cardholder = transaction.cardholder_id.as_str();

        let amount_anomaly = anomaly.amount_anomaly(cardholder, transaction.amount);
        let time_anomaly = anomaly.time_anomaly(cardholder, transaction.timestamp);
        let (rapid, rapid_count) = velocity.rapid_transactions(cardholder);
        let (high_frequency, daily_count) =
            velocity.high_frequency_day(cardholder, transaction.timestamp);
        let (impossible_travel, speed) =
            geographic.impossible_travel(cardholder, &transaction.location, transaction.timestamp);
        let country_shift = geographic.country_shift(cardholder, &transaction.country);
        let category_deviation =
            behavioral.category_deviation(cardholder, transaction.merchant_category);
        let new_merchant = behavioral.new_merchant(cardholder, &transaction.merchant_name);

        let weighted: [(IndicatorResult, f64); 8] = [
            (amount_anomaly, self.weights.amount_anomaly),
            (time_anomaly, self.weights.time_anomaly),
            (rapid, self.weights.rapid_transactions),
            (high_frequency, self.weights.high_frequency_day),
            (impossible_travel, self.weights.impossible_travel),
            (country_shift, self.weights.country_shift),
            (category_deviation, self.weights.category_deviation),
            (new_merchant, self.weights.new_merchant),
        ];

        let fraud_score = weighted_score(&weighted);
        let risk_level = RiskLevel::from_score(fraud_score, &self.risk_levels);

        let mut indicators = BTreeMap::new();
        indicators.insert("amount_anomaly".to_string(), amount_anomaly);
        indicators.insert("time_anomaly".to_string(), time_anomaly);
        indicators.insert("rapid_transactions".to_string(), rapid);
        indicators.insert("high_frequency_day".to_string(), high_frequency);
        indicators.insert("impossible_travel".to_string(), impossible_travel);
        indicators.insert("country_shift".to_string(), country_shift);
        indicators.insert("category_deviation".to_string(), category_deviation);
        indicators.insert("new_merchant".to_string(), new_merchant);

        let recommendation = recommendation(risk_level, impossible_travel, rapid);

        debug!(
            transaction_id = %transaction.transaction_id,
            fraud_score,
            risk_level = risk_level.as_str(),
            "Transaction analyzed"
        );

        FraudAnalysisResult {
            transaction_id: transaction.transaction_id.clone(),
            cardholder_id: transaction.cardholder_id.clone(),
            fraud_score,
            risk_level,
            fraud_indicators: indicators,
            recommendation,
            details: AnalysisDetails {
                transaction_amount: transaction.amount,
                merchant_name: transaction.merchant_name.clone(),
                merchant_category: transaction.merchant_category.as_str().to_string(),
                transaction_type: transaction.transaction_type.as_str().to_string(),
                country: transaction.country.clone(),
                timestamp: transaction.timestamp,
                rapid_tx_count: rapid_count,
                daily_tx_count: daily_count,
                impossible_travel_speed: speed,
            },
        }
    }

    /// Analyze each transaction independently against the same history
    /// snapshot.
    pub fn batch_analyze(&self, transactions: &[Transaction]) -> Vec<FraudAnalysisResult> {
        transactions.iter().map(|tx| self.analyze(tx)).collect()
    }

    /// Aggregate a batch of results into a summary report.
    pub fn summary_report(results: &[FraudAnalysisResult]) -> AnalysisSummary {
        let high_risk = results
            .iter()
            .filter(|r| matches!(r.risk_level, RiskLevel::High | RiskLevel::Critical))
            .count();
        let medium_risk = results
            .iter()
            .filter(|r| r.risk_level == RiskLevel::Medium)
            .count();

        let mut indicator_counts: BTreeMap<String, usize> = BTreeMap::new();
        for result in results {
            for (name, indicator) in &result.fraud_indicators {
                if indicator.triggered {
                    *indicator_counts.entry(name.clone()).or_insert(0) += 1;
                }
            }
        }
        let mut top: Vec<(String, usize)> = indicator_counts.into_iter().collect();
        top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top.truncate(5);

        let average_fraud_score = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.fraud_score).sum::<f64>() / results.len() as f64
        };

        AnalysisSummary {
            total_transactions: results.len(),
            high_risk_transactions: high_risk,
            medium_risk_transactions: medium_risk,
            average_fraud_score,
            top_fraud_indicators: top,
            estimated_fraud_transactions: high_risk + medium_risk / 2,
        }
    }
}

/// Weighted average of indicator confidences; an untriggered indicator
/// contributes its reported confidence, which is zero for every detector
/// except the amount z-score.
fn weighted_score(weighted: &[(IndicatorResult, f64)]) -> f64 {
    let total_weight: f64 = weighted.iter().map(|(_, w)| w).sum();
    if total_weight == 0.0 {
        return 0.0;
    }
    let weighted_sum: f64 = weighted.iter().map(|(r, w)| r.confidence * w).sum();
    weighted_sum / total_weight
}

fn recommendation(
    risk_level: RiskLevel,
    impossible_travel: IndicatorResult,
    rapid: IndicatorResult,
) -> String {
    match risk_level {
        RiskLevel::Critical => {
            "BLOCK_TRANSACTION - Multiple high-risk indicators detected".to_string()
        }
        RiskLevel::High => {
            if impossible_travel.triggered {
                "REQUIRE_VERIFICATION - Impossible travel detected".to_string()
            } else if rapid.triggered {
                "REQUIRE_VERIFICATION - Unusual transaction velocity".to_string()
            } else {
                "REVIEW_TRANSACTION - High fraud risk".to_string()
            }
        }
        RiskLevel::Medium => "MONITOR_TRANSACTION - Multiple moderate risk factors".to_string(),
        RiskLevel::Low => "APPROVE_TRANSACTION - Low fraud risk".to_string(),
    }
}

/// Summary of a batch of analysis results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_transactions: usize,
    pub high_risk_transactions: usize,
    pub medium_risk_transactions: usize,
    pub average_fraud_score: f64,
    /// Up to five (indicator, trigger count) pairs, most frequent first.
    pub top_fraud_indicators: Vec<(String, usize)>,
    pub estimated_fraud_transactions: usize,
}
