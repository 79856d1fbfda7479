//! Persisted record of an active tracking session.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{KeyValueStore, StoreError};
use crate::position::AccuracyHint;
use crate::tracking::TrackingConfig;

/// Key the active session is stored under.
pub const SESSION_KEY: &str = "rider:tracking_session";

/// Serializable form of [`TrackingConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTrackingConfig {
    pub polling_interval_ms: u64,
    pub movement_threshold_meters: f64,
    pub accuracy_threshold_meters: f64,
    pub location_timeout_ms: u64,
    #[serde(default)]
    pub accuracy_hint: String,
}

impl From<&TrackingConfig> for StoredTrackingConfig {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            polling_interval_ms: config.polling_interval.as_millis() as u64,
            movement_threshold_meters: config.movement_threshold_meters,
            accuracy_threshold_meters: config.accuracy_threshold_meters,
            location_timeout_ms: config.location_timeout.as_millis() as u64,
            accuracy_hint: config.accuracy_hint.to_string(),
        }
    }
}

impl From<&StoredTrackingConfig> for TrackingConfig {
    fn from(stored: &StoredTrackingConfig) -> Self {
        TrackingConfig {
            polling_interval: Duration::from_millis(stored.polling_interval_ms),
            movement_threshold_meters: stored.movement_threshold_meters,
            accuracy_threshold_meters: stored.accuracy_threshold_meters,
            location_timeout: Duration::from_millis(stored.location_timeout_ms),
            // Unknown hints from older records fall back to the default
            accuracy_hint: stored
                .accuracy_hint
                .parse::<AccuracyHint>()
                .unwrap_or_default(),
        }
    }
}

/// What a tracking session needs to pick up where it left off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub entity_id: String,
    pub config: StoredTrackingConfig,
    pub started_at: DateTime<Utc>,
}

impl ResumeRecord {
    pub fn new(entity_id: &str, config: &TrackingConfig) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            config: config.into(),
            started_at: Utc::now(),
        }
    }

    /// Keep the start time of an earlier record instead of now.
    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn tracking_config(&self) -> TrackingConfig {
        (&self.config).into()
    }

    /// Read the record, if one is stored.
    pub fn load(store: &dyn KeyValueStore) -> Result<Option<Self>, StoreError> {
        match store.get(SESSION_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        let raw = serde_json::to_string(self)?;
        store.set(SESSION_KEY, &raw)
    }

    pub fn clear(store: &dyn KeyValueStore) -> Result<(), StoreError> {
        store.remove(SESSION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_record_round_trips_through_store() {
        let store = MemoryStore::new();
        let config = TrackingConfig::default()
            .with_polling_interval(Duration::from_millis(1500))
            .with_accuracy_hint(AccuracyHint::High);

        ResumeRecord::new("order-42", &config).save(&store).unwrap();

        let loaded = ResumeRecord::load(&store).unwrap().unwrap();
        assert_eq!(loaded.entity_id, "order-42");
        assert_eq!(loaded.tracking_config(), config);

        ResumeRecord::clear(&store).unwrap();
        assert_eq!(ResumeRecord::load(&store).unwrap(), None);
    }

    #[test]
    fn test_unknown_hint_falls_back_to_default() {
        let stored = StoredTrackingConfig {
            polling_interval_ms: 20_000,
            movement_threshold_meters: 11.1,
            accuracy_threshold_meters: 100.0,
            location_timeout_ms: 10_000,
            accuracy_hint: "precise".to_string(),
        };
        let config: TrackingConfig = (&stored).into();
        assert_eq!(config.accuracy_hint, AccuracyHint::Balanced);
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let store = MemoryStore::new();
        store.set(SESSION_KEY, "{").unwrap();
        assert!(ResumeRecord::load(&store).is_err());
    }
}
