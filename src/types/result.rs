//! Fraud analysis result data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Classify a rule-engine fraud score. Boundaries are inclusive,
    /// evaluated highest-first.
    pub fn from_score(score: f64, thresholds: &RiskLevelThresholds) -> Self {
        if score >= thresholds.critical {
            RiskLevel::Critical
        } else if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Classify an ML ensemble score. Boundaries are strict, which gives
    /// different behavior at exactly 0.7/0.5/0.3 than the rule tiering.
    pub fn from_ensemble_score(score: f64) -> Self {
        if score > 0.7 {
            RiskLevel::Critical
        } else if score > 0.5 {
            RiskLevel::High
        } else if score > 0.3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

/// Rule-engine risk tier thresholds.
///
/// `low` is carried in configuration but never gates a comparison; LOW is
/// the fall-through tier below `medium`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskLevelThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            low: 0.3,
            medium: 0.5,
            high: 0.7,
            critical: 0.85,
        }
    }
}

/// Outcome of a single rule-based indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResult {
    pub triggered: bool,
    pub confidence: f64,
}

impl IndicatorResult {
    /// Not triggered, zero confidence.
    pub fn clear() -> Self {
        Self {
            triggered: false,
            confidence: 0.0,
        }
    }

    pub fn triggered(confidence: f64) -> Self {
        Self {
            triggered: true,
            confidence,
        }
    }
}

/// Raw transaction facts and detector intermediates carried for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDetails {
    pub transaction_amount: f64,
    pub merchant_name: String,
    pub merchant_category: String,
    pub transaction_type: String,
    pub country: String,
    pub timestamp: DateTime<Utc>,
    pub rapid_tx_count: usize,
    pub daily_tx_count: usize,
    /// Computed travel speed in km/h, when a prior transaction exists.
    pub impossible_travel_speed: Option<f64>,
}

/// Result of the rule-based fraud analysis of one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudAnalysisResult {
    pub transaction_id: String,
    pub cardholder_id: String,
    /// Weighted ensemble score in [0, 1].
    pub fraud_score: f64,
    pub risk_level: RiskLevel,
    pub fraud_indicators: BTreeMap<String, IndicatorResult>,
    pub recommendation: String,
    pub details: AnalysisDetails,
}

impl FraudAnalysisResult {
    /// Names of all indicators that fired.
    pub fn triggered_indicators(&self) -> Vec<&str> {
        self.fraud_indicators
            .iter()
            .filter(|(_, r)| r.triggered)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_tier_boundaries_are_exact() {
        let t = RiskLevelThresholds::default();

        assert_eq!(RiskLevel::from_score(0.85, &t), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(0.8499, &t), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.70, &t), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.6999, &t), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.50, &t), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.4999, &t), RiskLevel::Low);
    }

    #[test]
    fn test_ensemble_tier_boundaries_are_strict() {
        assert_eq!(RiskLevel::from_ensemble_score(0.71), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_ensemble_score(0.7), RiskLevel::High);
        assert_eq!(RiskLevel::from_ensemble_score(0.5), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_ensemble_score(0.3), RiskLevel::Low);
        assert_eq!(RiskLevel::from_ensemble_score(0.0), RiskLevel::Low);
    }

    #[test]
    fn test_risk_level_serialization() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::Critical).unwrap(),
            "\"CRITICAL\""
        );
        let back: RiskLevel = serde_json::from_str("\"LOW\"").unwrap();
        assert_eq!(back, RiskLevel::Low);
    }
}
