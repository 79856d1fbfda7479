//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::endpoint::ResolverConfig;
use crate::position::AccuracyHint;
use crate::tracking::TrackingConfig;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub endpoints: EndpointSettings,
    pub tracking: TrackingSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
}

/// Backend discovery and request timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSettings {
    /// Candidate base addresses in priority order.
    pub candidates: Vec<String>,
    /// Seconds allowed for each candidate probe.
    pub probe_timeout: u64,
    /// Seconds allowed for each API request.
    pub request_timeout: u64,
}

/// Location sampling thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSettings {
    pub polling_interval_ms: u64,
    pub movement_threshold_meters: f64,
    pub accuracy_threshold_meters: f64,
    /// Seconds allowed for one location capture.
    pub location_timeout: u64,
    pub accuracy_hint: AccuracyHint,
}

/// Session resumption storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub store_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl ConfigFile {
    /// Tracking config for new sessions.
    pub fn tracking_config(&self) -> TrackingConfig {
        TrackingConfig::default()
            .with_polling_interval(Duration::from_millis(self.tracking.polling_interval_ms))
            .with_movement_threshold_meters(self.tracking.movement_threshold_meters)
            .with_accuracy_threshold_meters(self.tracking.accuracy_threshold_meters)
            .with_location_timeout(Duration::from_secs(self.tracking.location_timeout))
            .with_accuracy_hint(self.tracking.accuracy_hint)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::new(&self.endpoints.candidates)
            .with_probe_timeout(Duration::from_secs(self.endpoints.probe_timeout))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.endpoints.request_timeout)
    }
}
