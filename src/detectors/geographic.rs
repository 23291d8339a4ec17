//! Geographic consistency checks

use crate::config::DetectorThresholds;
use crate::types::result::IndicatorResult;
use crate::types::transaction::{Location, TransactionStore};
use chrono::{DateTime, Utc};

/// Minimum history before a country profile is meaningful.
const MIN_COUNTRY_HISTORY: usize = 5;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers, by the
/// haversine formula.
pub fn haversine_km(a: &Location, b: &Location) -> f64 {
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Analyzes geographic patterns for fraud detection.
pub struct GeographicAnalyzer<'a> {
    store: &'a TransactionStore,
    thresholds: DetectorThresholds,
}

impl<'a> GeographicAnalyzer<'a> {
    pub fn new(store: &'a TransactionStore, thresholds: DetectorThresholds) -> Self {
        Self { store, thresholds }
    }

    /// Check whether reaching this transaction's location from the
    /// cardholder's most recent prior transaction would require implausible
    /// travel speed.
    ///
    /// Returns the indicator outcome and the computed speed in km/h; the
    /// speed is reported even when the check does not trigger. With no
    /// prior transaction, or a non-positive elapsed time, no speed is
    /// defined and the check is neutral.
    pub fn impossible_travel(
        &self,
        cardholder_id: &str,
        location: &Location,
        at: DateTime<Utc>,
    ) -> (IndicatorResult, Option<f64>) {
        let transactions = self.store.by_cardholder(cardholder_id);

        let Some(last) = transactions.iter().max_by_key(|t| t.timestamp) else {
            return (IndicatorResult::clear(), None);
        };

        let distance_km = haversine_km(&last.location, location);
        // Millisecond precision: a sub-second gap must still yield a speed.
        let elapsed_hours = (at - last.timestamp).num_milliseconds() as f64 / 3_600_000.0;

        if elapsed_hours <= 0.0 {
            return (IndicatorResult::clear(), None);
        }

        let speed = distance_km / elapsed_hours;
        let max_speed = self.thresholds.max_speed_kmh;

        if speed > max_speed {
            let confidence = ((speed - max_speed) / max_speed).min(1.0);
            (IndicatorResult::triggered(confidence), Some(speed))
        } else {
            (IndicatorResult::clear(), Some(speed))
        }
    }

    /// Check whether the transaction's country has never appeared in the
    /// cardholder's history.
    pub fn country_shift(&self, cardholder_id: &str, country: &str) -> IndicatorResult {
        let transactions = self.store.by_cardholder(cardholder_id);

        if transactions.len() < MIN_COUNTRY_HISTORY {
            return IndicatorResult::clear();
        }

        let occurrences = transactions.iter().filter(|t| t.country == country).count();

        if occurrences == 0 {
            IndicatorResult::triggered(0.6)
        } else {
            IndicatorResult::clear()
        }
    }
}
