//! Transaction velocity checks

use crate::config::DetectorThresholds;
use crate::types::result::IndicatorResult;
use crate::types::transaction::TransactionStore;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Minimum history before a rapid-transaction window can be formed.
const MIN_RAPID_HISTORY: usize = 2;
/// Minimum history before a daily-frequency baseline is meaningful.
const MIN_DAILY_HISTORY: usize = 5;

/// Checks for unusual transaction velocity patterns.
pub struct VelocityChecker<'a> {
    store: &'a TransactionStore,
    thresholds: DetectorThresholds,
}

impl<'a> VelocityChecker<'a> {
    pub fn new(store: &'a TransactionStore, thresholds: DetectorThresholds) -> Self {
        Self { store, thresholds }
    }

    /// Check for too many transactions inside a short window ending at the
    /// cardholder's most recent transaction.
    ///
    /// Returns the indicator outcome and the number of transactions counted
    /// in the window.
    pub fn rapid_transactions(&self, cardholder_id: &str) -> (IndicatorResult, usize) {
        let transactions = self.store.by_cardholder(cardholder_id);

        if transactions.len() < MIN_RAPID_HISTORY {
            return (IndicatorResult::clear(), 0);
        }

        let mut recent: Vec<_> = transactions.clone();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(5);

        let window_end = recent[0].timestamp;
        let window_start = window_end - Duration::minutes(self.thresholds.rapid_window_minutes);

        // Count against the full history, not just the five most recent.
        let count = transactions
            .iter()
            .filter(|t| t.timestamp >= window_start && t.timestamp <= window_end)
            .count();

        if count >= self.thresholds.rapid_count_threshold {
            let confidence =
                ((count as f64 - 2.0) / self.thresholds.rapid_count_threshold as f64).min(1.0);
            (IndicatorResult::triggered(confidence), count)
        } else {
            (IndicatorResult::clear(), count)
        }
    }

    /// Check whether the target date carries unusually many transactions
    /// versus the cardholder's mean per-day count.
    pub fn high_frequency_day(
        &self,
        cardholder_id: &str,
        target: DateTime<Utc>,
    ) -> (IndicatorResult, usize) {
        let transactions = self.store.by_cardholder(cardholder_id);

        if transactions.len() < MIN_DAILY_HISTORY {
            return (IndicatorResult::clear(), 0);
        }

        let mut daily_counts: HashMap<chrono::NaiveDate, usize> = HashMap::new();
        for t in &transactions {
            *daily_counts.entry(t.timestamp.date_naive()).or_insert(0) += 1;
        }

        let avg_daily =
            daily_counts.values().sum::<usize>() as f64 / daily_counts.len() as f64;
        let target_count = daily_counts.get(&target.date_naive()).copied().unwrap_or(0);

        if avg_daily == 0.0 {
            return (IndicatorResult::clear(), target_count);
        }

        if target_count as f64 > avg_daily * self.thresholds.daily_multiplier {
            let confidence = ((target_count as f64 - avg_daily) / avg_daily).min(1.0);
            (IndicatorResult::triggered(confidence), target_count)
        } else {
            (IndicatorResult::clear(), target_count)
        }
    }
}
