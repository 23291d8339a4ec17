//! Core data types

pub mod result;
pub mod transaction;

pub use result::{FraudAnalysisResult, IndicatorResult, RiskLevel, RiskLevelThresholds};
pub use transaction::{
    Location, MerchantCategory, Transaction, TransactionStore, TransactionType,
};
