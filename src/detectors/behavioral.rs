//! Behavioral pattern checks

use crate::config::DetectorThresholds;
use crate::types::result::IndicatorResult;
use crate::types::transaction::{MerchantCategory, TransactionStore};

/// Minimum history before a category profile is meaningful.
const MIN_CATEGORY_HISTORY: usize = 5;
/// Minimum history before a merchant list is meaningful.
const MIN_MERCHANT_HISTORY: usize = 3;

/// Analyzes a cardholder's typical merchant and category patterns.
pub struct BehavioralAnalyzer<'a> {
    store: &'a TransactionStore,
    thresholds: DetectorThresholds,
}

impl<'a> BehavioralAnalyzer<'a> {
    pub fn new(store: &'a TransactionStore, thresholds: DetectorThresholds) -> Self {
        Self { store, thresholds }
    }

    /// Check whether the merchant category is unusual for this cardholder.
    pub fn category_deviation(
        &self,
        cardholder_id: &str,
        category: MerchantCategory,
    ) -> IndicatorResult {
        let transactions = self.store.by_cardholder(cardholder_id);

        if transactions.len() < MIN_CATEGORY_HISTORY {
            return IndicatorResult::clear();
        }

        let matching = transactions
            .iter()
            .filter(|t| t.merchant_category == category)
            .count();
        let frequency = matching as f64 / transactions.len() as f64;

        if frequency < self.thresholds.category_frequency_floor {
            IndicatorResult::triggered(1.0 - frequency)
        } else {
            IndicatorResult::clear()
        }
    }

    /// Check whether the merchant has never been seen for this cardholder.
    pub fn new_merchant(&self, cardholder_id: &str, merchant_name: &str) -> IndicatorResult {
        let transactions = self.store.by_cardholder(cardholder_id);

        if transactions.len() < MIN_MERCHANT_HISTORY {
            return IndicatorResult::clear();
        }

        let known = transactions
            .iter()
            .any(|t| t.merchant_name == merchant_name);

        if known {
            IndicatorResult::clear()
        } else {
            IndicatorResult::triggered(0.3)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::{Location, Transaction, TransactionType};
    use chrono::{Duration, TimeZone, Utc};

    fn tx(id: &str, merchant: &str, category: MerchantCategory, offset_days: i64) -> Transaction {
        let base = Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap();
        Transaction {
            transaction_id: id.to_string(),
            cardholder_id: "ch_1".to_string(),
            amount: 50.0,
            timestamp: base + Duration::days(offset_days),
            merchant_name: merchant.to_string(),
            merchant_category: category,
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

    fn analyzer(store: &TransactionStore) -> BehavioralAnalyzer<'_> {
        BehavioralAnalyzer::new(store, DetectorThresholds::default())
    }

    #[test]
    fn test_category_deviation() {
        let mut store = TransactionStore::new();
        for i in 0..10 {
            store.add(tx(&format!("t{i}"), "Safeway", MerchantCategory::Grocery, i));
        }

        let a = analyzer(&store);
        let result = a.category_deviation("ch_1", MerchantCategory::CashAdvance);
        assert!(result.triggered);
        assert_eq!(result.confidence, 1.0);

        let result = a.category_deviation("ch_1", MerchantCategory::Grocery);
        assert!(!result.triggered);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_category_deviation_needs_history() {
        let mut store = TransactionStore::new();
        for i in 0..4 {
            store.add(tx(&format!("t{i}"), "Safeway", MerchantCategory::Grocery, i));
        }
        let result = analyzer(&store).category_deviation("ch_1", MerchantCategory::CashAdvance);
        assert!(!result.triggered);
    }

    #[test]
    fn test_new_merchant() {
        let mut store = TransactionStore::new();
        for i in 0..3 {
            store.add(tx(&format!("t{i}"), "Safeway", MerchantCategory::Grocery, i));
        }

        let a = analyzer(&store);
        let result = a.new_merchant("ch_1", "Totally New Shop");
        assert!(result.triggered);
        assert_eq!(result.confidence, 0.3);

        let result = a.new_merchant("ch_1", "Safeway");
        assert!(!result.triggered);
    }

    #[test]
    fn test_new_merchant_needs_history() {
        let mut store = TransactionStore::new();
        store.add(tx("t0", "Safeway", MerchantCategory::Grocery, 0));
        store.add(tx("t1", "Safeway", MerchantCategory::Grocery, 1));

        let result = analyzer(&store).new_merchant("ch_1", "Totally New Shop");
        assert!(!result.triggered);
        assert_eq!(result.confidence, 0.0);
    }
}
