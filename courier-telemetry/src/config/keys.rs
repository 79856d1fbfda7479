//! Configuration key access and validation.
//!
//! Every INI key is a [`ConfigKey`] that knows its section, how to render its
//! current value, and how to parse and validate a new one. The INI parser and
//! the CLI `config get/set` commands both go through it.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use super::settings::ConfigFile;
use crate::position::AccuracyHint;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigKeyError {
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    EndpointsCandidates,
    EndpointsProbeTimeout,
    EndpointsRequestTimeout,

    TrackingPollingIntervalMs,
    TrackingMovementThresholdMeters,
    TrackingAccuracyThresholdMeters,
    TrackingLocationTimeout,
    TrackingAccuracyHint,

    SessionStoreFile,

    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Full `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::EndpointsCandidates => "endpoints.candidates",
            Self::EndpointsProbeTimeout => "endpoints.probe_timeout",
            Self::EndpointsRequestTimeout => "endpoints.request_timeout",
            Self::TrackingPollingIntervalMs => "tracking.polling_interval_ms",
            Self::TrackingMovementThresholdMeters => "tracking.movement_threshold_meters",
            Self::TrackingAccuracyThresholdMeters => "tracking.accuracy_threshold_meters",
            Self::TrackingLocationTimeout => "tracking.location_timeout",
            Self::TrackingAccuracyHint => "tracking.accuracy_hint",
            Self::SessionStoreFile => "session.store_file",
            Self::LoggingFile => "logging.file",
        }
    }

    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or_default()
    }

    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or_default()
    }

    /// Render the current value as it would appear in the INI file.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            Self::EndpointsCandidates => config.endpoints.candidates.join(", "),
            Self::EndpointsProbeTimeout => config.endpoints.probe_timeout.to_string(),
            Self::EndpointsRequestTimeout => config.endpoints.request_timeout.to_string(),
            Self::TrackingPollingIntervalMs => config.tracking.polling_interval_ms.to_string(),
            Self::TrackingMovementThresholdMeters => {
                config.tracking.movement_threshold_meters.to_string()
            }
            Self::TrackingAccuracyThresholdMeters => {
                config.tracking.accuracy_threshold_meters.to_string()
            }
            Self::TrackingLocationTimeout => config.tracking.location_timeout.to_string(),
            Self::TrackingAccuracyHint => config.tracking.accuracy_hint.to_string(),
            Self::SessionStoreFile => path_to_display(&config.session.store_file),
            Self::LoggingFile => path_to_display(&config.logging.file),
        }
    }

    /// Parse, validate and store a new value.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let value = value.trim();
        match self {
            Self::EndpointsCandidates => config.endpoints.candidates = self.parse_candidates(value)?,
            Self::EndpointsProbeTimeout => config.endpoints.probe_timeout = self.parse_positive(value)?,
            Self::EndpointsRequestTimeout => {
                config.endpoints.request_timeout = self.parse_positive(value)?
            }
            Self::TrackingPollingIntervalMs => {
                config.tracking.polling_interval_ms = self.parse_positive(value)?
            }
            Self::TrackingMovementThresholdMeters => {
                config.tracking.movement_threshold_meters = self.parse_meters(value)?
            }
            Self::TrackingAccuracyThresholdMeters => {
                config.tracking.accuracy_threshold_meters = self.parse_meters(value)?
            }
            Self::TrackingLocationTimeout => {
                config.tracking.location_timeout = self.parse_positive(value)?
            }
            Self::TrackingAccuracyHint => {
                config.tracking.accuracy_hint = value
                    .parse::<AccuracyHint>()
                    .map_err(|_| self.invalid("must be one of: low, balanced, high"))?
            }
            Self::SessionStoreFile => config.session.store_file = self.parse_path(value)?,
            Self::LoggingFile => config.logging.file = self.parse_path(value)?,
        }
        Ok(())
    }

    /// All supported keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            Self::EndpointsCandidates,
            Self::EndpointsProbeTimeout,
            Self::EndpointsRequestTimeout,
            Self::TrackingPollingIntervalMs,
            Self::TrackingMovementThresholdMeters,
            Self::TrackingAccuracyThresholdMeters,
            Self::TrackingLocationTimeout,
            Self::TrackingAccuracyHint,
            Self::SessionStoreFile,
            Self::LoggingFile,
        ]
    }

    fn invalid(&self, reason: &str) -> ConfigKeyError {
        ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: reason.to_string(),
        }
    }

    fn parse_positive(&self, value: &str) -> Result<u64, ConfigKeyError> {
        match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(self.invalid("must be a positive integer")),
        }
    }

    fn parse_meters(&self, value: &str) -> Result<f64, ConfigKeyError> {
        match value.parse::<f64>() {
            Ok(m) if m.is_finite() && m >= 0.0 => Ok(m),
            _ => Err(self.invalid("must be a non-negative number of meters")),
        }
    }

    fn parse_candidates(&self, value: &str) -> Result<Vec<String>, ConfigKeyError> {
        let candidates: Vec<String> = value
            .split(',')
            .map(|c| c.trim().trim_end_matches('/').to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if candidates.is_empty() {
            return Err(self.invalid("at least one base URL is required"));
        }
        if let Some(bad) = candidates
            .iter()
            .find(|c| !c.starts_with("http://") && !c.starts_with("https://"))
        {
            return Err(self.invalid(&format!("'{}' must start with http:// or https://", bad)));
        }
        Ok(candidates)
    }

    fn parse_path(&self, value: &str) -> Result<PathBuf, ConfigKeyError> {
        if value.is_empty() {
            return Err(self.invalid("path must not be empty"));
        }
        Ok(expand_tilde(value))
    }
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Render a path with the home directory abbreviated to `~`.
pub(super) fn path_to_display(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
