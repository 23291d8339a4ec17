//! Rule-based fraud detectors
//!
//! Each detector reads a cardholder's history from the store and reports an
//! [`IndicatorResult`](crate::types::result::IndicatorResult). Insufficient
//! history is never an error; it yields a neutral (not triggered, 0.0)
//! outcome.

pub mod anomaly;
pub mod behavioral;
pub mod geographic;
pub mod velocity;

pub use anomaly::AnomalyDetector;
pub use behavioral::BehavioralAnalyzer;
pub use geographic::{haversine_km, GeographicAnalyzer};
pub use velocity::VelocityChecker;
