//! Statistical anomaly detection over a cardholder's transaction history

use crate::config::DetectorThresholds;
use crate::types::result::IndicatorResult;
use crate::types::transaction::TransactionStore;
use chrono::{DateTime, Timelike, Utc};

/// Minimum history before an amount can be judged against its distribution.
const MIN_AMOUNT_HISTORY: usize = 3;
/// Minimum history before an hour-of-day profile is meaningful.
const MIN_TIME_HISTORY: usize = 5;

/// Detects statistical anomalies in transaction amounts and times.
pub struct AnomalyDetector<'a> {
    store: &'a TransactionStore,
    thresholds: DetectorThresholds,
}

impl<'a> AnomalyDetector<'a> {
    pub fn new(store: &'a TransactionStore, thresholds: DetectorThresholds) -> Self {
        Self { store, thresholds }
    }

    /// Check whether an amount deviates from the cardholder's historical
    /// distribution.
    ///
    /// With a degenerate (zero variance) history, any deviation beyond 10%
    /// of the mean triggers at a fixed 0.7 confidence. Otherwise the z-score
    /// gates at `amount_zscore` and the confidence `min(z/3, 1)` is reported
    /// whether or not the check triggers.
    pub fn amount_anomaly(&self, cardholder_id: &str, amount: f64) -> IndicatorResult {
        let transactions = self.store.by_cardholder(cardholder_id);

        if transactions.len() < MIN_AMOUNT_HISTORY {
            return IndicatorResult::clear();
        }

        let amounts: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
        let mean = amounts.iter().sum::<f64>() / amounts.len() as f64;
        let std_dev = sample_std_dev(&amounts, mean);

        if std_dev == 0.0 {
            if (amount - mean).abs() > mean * 0.1 {
                return IndicatorResult::triggered(0.7);
            }
            return IndicatorResult::clear();
        }

        let z_score = ((amount - mean) / std_dev).abs();
        IndicatorResult {
            triggered: z_score > self.thresholds.amount_zscore,
            confidence: (z_score / 3.0).min(1.0),
        }
    }

    /// Check whether a transaction's hour-of-day is unusual for the
    /// cardholder.
    pub fn time_anomaly(&self, cardholder_id: &str, at: DateTime<Utc>) -> IndicatorResult {
        let transactions = self.store.by_cardholder(cardholder_id);

        if transactions.len() < MIN_TIME_HISTORY {
            return IndicatorResult::clear();
        }

        let hour = at.hour();
        let matching = transactions
            .iter()
            .filter(|t| t.timestamp.hour() == hour)
            .count();
        let frequency = matching as f64 / transactions.len() as f64;

        if frequency < self.thresholds.hour_frequency_floor {
            IndicatorResult::triggered(1.0 - frequency)
        } else {
            IndicatorResult::clear()
        }
    }
}

/// Sample standard deviation (n-1 denominator).
fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::{Location, MerchantCategory, Transaction, TransactionType};
    use chrono::TimeZone;

    fn tx_at(id: &str, amount: f64, hour: u32) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            cardholder_id: "ch_1".to_string(),
            amount,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 6, hour, 0, 0).unwrap(),
            merchant_name: "Corner Store".to_string(),
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

    fn detector(store: &TransactionStore) -> AnomalyDetector<'_> {
        AnomalyDetector::new(store, DetectorThresholds::default())
    }

    #[test]
    fn test_amount_anomaly_needs_three_transactions() {
        let mut store = TransactionStore::new();
        store.add(tx_at("t1", 50.0, 10));
        store.add(tx_at("t2", 60.0, 11));

        let result = detector(&store).amount_anomaly("ch_1", 10_000.0);
        assert!(!result.triggered);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_amount_anomaly_triggers_on_outlier() {
        let mut store = TransactionStore::new();
        for (i, amount) in [50.0, 60.0, 55.0, 45.0, 52.0].iter().enumerate() {
            store.add(tx_at(&format!("t{i}"), *amount, 10));
        }

        let result = detector(&store).amount_anomaly("ch_1", 3500.0);
        assert!(result.triggered);
        assert_eq!(result.confidence, 1.0);

        // A typical amount does not trigger but still reports its z-score.
        let result = detector(&store).amount_anomaly("ch_1", 53.0);
        assert!(!result.triggered);
        assert!(result.confidence < 1.0);
    }

    #[test]
    fn test_amount_anomaly_zero_variance_branch() {
        let mut store = TransactionStore::new();
        for i in 0..4 {
            store.add(tx_at(&format!("t{i}"), 100.0, 10));
        }

        let d = detector(&store);
        let result = d.amount_anomaly("ch_1", 150.0);
        assert!(result.triggered);
        assert_eq!(result.confidence, 0.7);

        // Within 10% of the mean: no trigger.
        let result = d.amount_anomaly("ch_1", 105.0);
        assert!(!result.triggered);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_time_anomaly_rare_hour() {
        let mut store = TransactionStore::new();
        for i in 0..20 {
            store.add(tx_at(&format!("t{i}"), 50.0, 12));
        }
        store.add(tx_at("night", 50.0, 3));

        let d = detector(&store);
        // 1/21 of history at 3 AM is below the 5% floor.
        let at = Utc.with_ymd_and_hms(2025, 1, 7, 3, 30, 0).unwrap();
        let result = d.time_anomaly("ch_1", at);
        assert!(result.triggered);
        assert!((result.confidence - (1.0 - 1.0 / 21.0)).abs() < 1e-12);

        let at = Utc.with_ymd_and_hms(2025, 1, 7, 12, 30, 0).unwrap();
        let result = d.time_anomaly("ch_1", at);
        assert!(!result.triggered);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_time_anomaly_needs_five_transactions() {
        let mut store = TransactionStore::new();
        for i in 0..4 {
            store.add(tx_at(&format!("t{i}"), 50.0, 12));
        }
        let at = Utc.with_ymd_and_hms(2025, 1, 7, 3, 0, 0).unwrap();
        let result = detector(&store).time_anomaly("ch_1", at);
        assert!(!result.triggered);
    }
}
