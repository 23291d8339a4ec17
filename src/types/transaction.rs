//! Transaction data structures and the append-only transaction store

use crate::error::{FraudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Types of transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Purchase,
    Withdrawal,
    Transfer,
    Online,
    International,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Purchase => "purchase",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Transfer => "transfer",
            TransactionType::Online => "online",
            TransactionType::International => "international",
        }
    }
}

impl FromStr for TransactionType {
    type Err = FraudError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "purchase" => Ok(TransactionType::Purchase),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "transfer" => Ok(TransactionType::Transfer),
            "online" => Ok(TransactionType::Online),
            "international" => Ok(TransactionType::International),
            _ => Err(FraudError::Validation {
                field: "transaction_type",
                value: s.to_string(),
            }),
        }
    }
}

/// Merchant categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MerchantCategory {
    Grocery,
    Restaurant,
    Retail,
    Gas,
    Utilities,
    Entertainment,
    Travel,
    OnlineRetail,
    CashAdvance,
    Other,
}

impl MerchantCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MerchantCategory::Grocery => "grocery",
            MerchantCategory::Restaurant => "restaurant",
            MerchantCategory::Retail => "retail",
            MerchantCategory::Gas => "gas",
            MerchantCategory::Utilities => "utilities",
            MerchantCategory::Entertainment => "entertainment",
            MerchantCategory::Travel => "travel",
            MerchantCategory::OnlineRetail => "online_retail",
            MerchantCategory::CashAdvance => "cash_advance",
            MerchantCategory::Other => "other",
        }
    }
}

impl FromStr for MerchantCategory {
    type Err = FraudError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "grocery" => Ok(MerchantCategory::Grocery),
            "restaurant" => Ok(MerchantCategory::Restaurant),
            "retail" => Ok(MerchantCategory::Retail),
            "gas" => Ok(MerchantCategory::Gas),
            "utilities" => Ok(MerchantCategory::Utilities),
            "entertainment" => Ok(MerchantCategory::Entertainment),
            "travel" => Ok(MerchantCategory::Travel),
            "online_retail" => Ok(MerchantCategory::OnlineRetail),
            "cash_advance" => Ok(MerchantCategory::CashAdvance),
            "other" => Ok(MerchantCategory::Other),
            _ => Err(FraudError::Validation {
                field: "merchant_category",
                value: s.to_string(),
            }),
        }
    }
}

/// Geolocation of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// A single payment transaction.
///
/// Immutable once appended to a store, except for the fraud flag which is
/// set through [`TransactionStore::mark_fraud`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub cardholder_id: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub merchant_name: String,
    pub merchant_category: MerchantCategory,
    pub transaction_type: TransactionType,
    pub location: Location,
    /// Merchant Category Code
    pub mcc_code: String,
    pub country: String,
    #[serde(default)]
    pub is_fraud: bool,
}

impl Transaction {
    /// Parse an ISO-8601 timestamp string into the store's timestamp type.
    pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
        let parsed = DateTime::parse_from_rfc3339(raw)?;
        Ok(parsed.with_timezone(&Utc))
    }
}

/// Append-only ledger of transactions with a secondary index by cardholder.
///
/// Single-writer usage is assumed; readers must be externally synchronized
/// against a concurrent `add` or `mark_fraud`.
#[derive(Debug, Default)]
pub struct TransactionStore {
    transactions: Vec<Transaction>,
    by_cardholder: HashMap<String, Vec<usize>>,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction to the ledger and the cardholder index.
    pub fn add(&mut self, transaction: Transaction) {
        let idx = self.transactions.len();
        self.by_cardholder
            .entry(transaction.cardholder_id.clone())
            .or_default()
            .push(idx);
        self.transactions.push(transaction);
    }

    /// All transactions in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// All transactions for a cardholder, in insertion order. Empty for an
    /// unknown cardholder.
    pub fn by_cardholder(&self, cardholder_id: &str) -> Vec<&Transaction> {
        self.by_cardholder
            .get(cardholder_id)
            .map(|indices| indices.iter().map(|&i| &self.transactions[i]).collect())
            .unwrap_or_default()
    }

    /// A cardholder's transactions with timestamps in `[start, end]`,
    /// boundaries inclusive.
    pub fn in_timeframe(
        &self,
        cardholder_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<&Transaction> {
        self.by_cardholder(cardholder_id)
            .into_iter()
            .filter(|t| t.timestamp >= start && t.timestamp <= end)
            .collect()
    }

    /// Sum of all transaction amounts for a cardholder.
    pub fn total_amount(&self, cardholder_id: &str) -> f64 {
        self.by_cardholder(cardholder_id)
            .iter()
            .map(|t| t.amount)
            .sum()
    }

    /// All transactions currently flagged as fraudulent.
    pub fn fraud_transactions(&self) -> Vec<&Transaction> {
        self.transactions.iter().filter(|t| t.is_fraud).collect()
    }

    /// Flag the transaction with the given id as fraudulent.
    ///
    /// Returns whether a matching transaction was found.
    pub fn mark_fraud(&mut self, transaction_id: &str) -> bool {
        for transaction in &mut self.transactions {
            if transaction.transaction_id == transaction_id {
                transaction.is_fraud = true;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_tx(id: &str, cardholder: &str, amount: f64) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            cardholder_id: cardholder.to_string(),
            amount,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap(),
            merchant_name: "Whole Foods".to_string(),
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

    #[test]
    fn test_transaction_serialization_round_trip() {
        let tx = sample_tx("tx_001", "ch_001", 42.50);

        let json = serde_json::to_string(&tx).unwrap();
        assert!(json.contains("\"grocery\""));
        assert!(json.contains("\"purchase\""));

        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.transaction_id, tx.transaction_id);
        assert_eq!(back.merchant_category, MerchantCategory::Grocery);
        assert_eq!(back.timestamp, tx.timestamp);
    }

    #[test]
    fn test_unknown_category_tag_fails() {
        let err = "groceries".parse::<MerchantCategory>().unwrap_err();
        assert!(matches!(
            err,
            FraudError::Validation {
                field: "merchant_category",
                ..
            }
        ));

        assert!("cash_advance".parse::<MerchantCategory>().is_ok());
        assert!("refund".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_timestamp_parsing() {
        let ts = Transaction::parse_timestamp("2025-01-06T12:00:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap());

        assert!(matches!(
            Transaction::parse_timestamp("not-a-timestamp"),
            Err(FraudError::Parse(_))
        ));
    }

    #[test]
    fn test_store_index_and_totals() {
        let mut store = TransactionStore::new();
        store.add(sample_tx("tx_1", "ch_a", 10.0));
        store.add(sample_tx("tx_2", "ch_b", 20.0));
        store.add(sample_tx("tx_3", "ch_a", 30.0));

        let for_a = store.by_cardholder("ch_a");
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[0].transaction_id, "tx_1");
        assert_eq!(for_a[1].transaction_id, "tx_3");

        assert!(store.by_cardholder("ch_unknown").is_empty());
        assert_eq!(store.total_amount("ch_a"), 40.0);
        assert_eq!(store.total_amount("ch_unknown"), 0.0);
    }

    #[test]
    fn test_in_timeframe_is_inclusive() {
        let mut store = TransactionStore::new();
        let mut tx = sample_tx("tx_1", "ch_a", 10.0);
        tx.timestamp = Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap();
        store.add(tx);

        let start = Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap();
        assert_eq!(store.in_timeframe("ch_a", start, end).len(), 1);

        let later = Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 1).unwrap();
        assert!(store.in_timeframe("ch_a", later, later).is_empty());
    }

    #[test]
    fn test_mark_fraud() {
        let mut store = TransactionStore::new();
        store.add(sample_tx("tx_1", "ch_a", 10.0));

        assert!(!store.mark_fraud("tx_missing"));
        assert!(store.fraud_transactions().is_empty());

        assert!(store.mark_fraud("tx_1"));
        assert!(store.mark_fraud("tx_1"));
        assert_eq!(store.fraud_transactions().len(), 1);
        assert!(store.transactions()[0].is_fraud);
    }
}
