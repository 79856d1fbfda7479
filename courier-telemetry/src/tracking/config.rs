//! Tracking session configuration.

use std::time::Duration;

use super::error::TrackingError;
use crate::position::{AccuracyHint, GateThresholds};

/// Default interval between location captures (20 seconds).
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(20_000);

/// Default minimum displacement before a fix is reported.
///
/// Roughly 0.0001 degrees of latitude.
pub const DEFAULT_MOVEMENT_THRESHOLD_METERS: f64 = 11.1;

/// Default maximum accepted accuracy radius.
pub const DEFAULT_ACCURACY_THRESHOLD_METERS: f64 = 100.0;

/// Default upper bound for a single location capture.
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Thresholds and timings for a tracking session.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    /// Interval between captures. The first capture happens immediately.
    pub polling_interval: Duration,
    /// A fix must move strictly further than this from the last accepted one.
    pub movement_threshold_meters: f64,
    /// Fixes with an accuracy radius above this are discarded.
    pub accuracy_threshold_meters: f64,
    /// Upper bound for one provider call.
    pub location_timeout: Duration,
    /// Quality requested from the provider.
    pub accuracy_hint: AccuracyHint,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            polling_interval: DEFAULT_POLLING_INTERVAL,
            movement_threshold_meters: DEFAULT_MOVEMENT_THRESHOLD_METERS,
            accuracy_threshold_meters: DEFAULT_ACCURACY_THRESHOLD_METERS,
            location_timeout: DEFAULT_LOCATION_TIMEOUT,
            accuracy_hint: AccuracyHint::default(),
        }
    }
}

impl TrackingConfig {
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    pub fn with_movement_threshold_meters(mut self, meters: f64) -> Self {
        self.movement_threshold_meters = meters;
        self
    }

    pub fn with_accuracy_threshold_meters(mut self, meters: f64) -> Self {
        self.accuracy_threshold_meters = meters;
        self
    }

    pub fn with_location_timeout(mut self, timeout: Duration) -> Self {
        self.location_timeout = timeout;
        self
    }

    pub fn with_accuracy_hint(mut self, hint: AccuracyHint) -> Self {
        self.accuracy_hint = hint;
        self
    }

    /// Limits handed to the movement gate.
    pub fn gate_thresholds(&self) -> GateThresholds {
        GateThresholds::new(
            self.movement_threshold_meters,
            self.accuracy_threshold_meters,
        )
    }

    /// Check that the configuration can drive a session.
    pub fn validate(&self) -> Result<(), TrackingError> {
        if self.polling_interval.is_zero() {
            return Err(TrackingError::InvalidConfig(
                "polling interval must be greater than zero".to_string(),
            ));
        }
        if self.location_timeout.is_zero() {
            return Err(TrackingError::InvalidConfig(
                "location timeout must be greater than zero".to_string(),
            ));
        }
        if !self.movement_threshold_meters.is_finite() || self.movement_threshold_meters < 0.0 {
            return Err(TrackingError::InvalidConfig(format!(
                "movement threshold must be a non-negative number of meters, got {}",
                self.movement_threshold_meters
            )));
        }
        if !self.accuracy_threshold_meters.is_finite() || self.accuracy_threshold_meters < 0.0 {
            return Err(TrackingError::InvalidConfig(format!(
                "accuracy threshold must be a non-negative number of meters, got {}",
                self.accuracy_threshold_meters
            )));
        }
        Ok(())
    }
}
