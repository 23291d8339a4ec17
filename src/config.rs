//! Configuration management for the fraud scoring engine

use crate::types::result::RiskLevelThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Rule-engine configuration: indicator weights, detector thresholds and
/// risk tiering.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectionConfig {
    #[serde(default)]
    pub weights: IndicatorWeights,
    #[serde(default)]
    pub thresholds: DetectorThresholds,
    #[serde(default)]
    pub risk_levels: RiskLevelThresholds,
}

/// Fixed weights assigned to each rule indicator in the ensemble score.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IndicatorWeights {
    pub amount_anomaly: f64,
    pub time_anomaly: f64,
    pub rapid_transactions: f64,
    pub high_frequency_day: f64,
    pub impossible_travel: f64,
    pub country_shift: f64,
    pub category_deviation: f64,
    pub new_merchant: f64,
}

impl IndicatorWeights {
    pub fn total(&self) -> f64 {
        self.amount_anomaly
            + self.time_anomaly
            + self.rapid_transactions
            + self.high_frequency_day
            + self.impossible_travel
            + self.country_shift
            + self.category_deviation
            + self.new_merchant
    }
}

impl Default for IndicatorWeights {
    fn default() -> Self {
        Self {
            amount_anomaly: 0.20,
            time_anomaly: 0.10,
            rapid_transactions: 0.25,
            high_frequency_day: 0.15,
            impossible_travel: 0.30,
            country_shift: 0.20,
            category_deviation: 0.10,
            new_merchant: 0.15,
        }
    }
}

/// Tunable thresholds used by the individual detectors.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DetectorThresholds {
    /// Z-score above which an amount is anomalous.
    pub amount_zscore: f64,
    /// Hour-of-day frequency below which a transaction time is unusual.
    pub hour_frequency_floor: f64,
    /// Rapid-transaction window length in minutes.
    pub rapid_window_minutes: i64,
    /// Transactions inside the window needed to flag rapid activity.
    pub rapid_count_threshold: usize,
    /// Multiple of the mean daily count that flags a high-frequency day.
    pub daily_multiplier: f64,
    /// Travel speed in km/h above which travel is impossible.
    pub max_speed_kmh: f64,
    /// Category frequency below which a merchant category is unusual.
    pub category_frequency_floor: f64,
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        Self {
            amount_zscore: 2.5,
            hour_frequency_floor: 0.05,
            rapid_window_minutes: 10,
            rapid_count_threshold: 3,
            daily_multiplier: 2.0,
            max_speed_kmh: 900.0,
            category_frequency_floor: 0.05,
        }
    }
}

/// Hyperparameters for the ML ensemble.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    pub num_trees: usize,
    pub max_depth: usize,
    /// Optional fixed seed for bootstrap sampling; `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            epochs: 100,
            num_trees: 10,
            max_depth: 5,
            seed: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location.
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.detection.weights.impossible_travel, 0.30);
        assert_eq!(config.detection.risk_levels.critical, 0.85);
        assert_eq!(config.detection.thresholds.max_speed_kmh, 900.0);
        assert_eq!(config.training.epochs, 100);
        assert_eq!(config.training.num_trees, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_weight_total() {
        let weights = IndicatorWeights::default();
        assert!((weights.total() - 1.45).abs() < 1e-12);
    }
}
