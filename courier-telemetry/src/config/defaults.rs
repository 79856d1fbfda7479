//! Default values for all configuration settings.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::endpoint::DEFAULT_CANDIDATES;
use crate::position::AccuracyHint;
use crate::tracking::{
    DEFAULT_ACCURACY_THRESHOLD_METERS, DEFAULT_LOCATION_TIMEOUT, DEFAULT_MOVEMENT_THRESHOLD_METERS,
    DEFAULT_POLLING_INTERVAL,
};

/// Name of the per-user configuration directory under the home directory.
pub const CONFIG_DIR_NAME: &str = ".courier-telemetry";

/// Default probe timeout in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// Default API request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default session store file (~/.courier-telemetry/session.json).
pub fn default_store_file() -> PathBuf {
    config_directory().join("session.json")
}

/// Default log file (~/.courier-telemetry/logs/courier-telemetry.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join("logs").join("courier-telemetry.log")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            endpoints: EndpointSettings {
                candidates: DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
                probe_timeout: DEFAULT_PROBE_TIMEOUT_SECS,
                request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            },
            tracking: TrackingSettings {
                polling_interval_ms: DEFAULT_POLLING_INTERVAL.as_millis() as u64,
                movement_threshold_meters: DEFAULT_MOVEMENT_THRESHOLD_METERS,
                accuracy_threshold_meters: DEFAULT_ACCURACY_THRESHOLD_METERS,
                location_timeout: DEFAULT_LOCATION_TIMEOUT.as_secs(),
                accuracy_hint: AccuracyHint::default(),
            },
            session: SessionSettings {
                store_file: default_store_file(),
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}
