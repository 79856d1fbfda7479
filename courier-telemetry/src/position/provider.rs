//! Device location provider abstraction.
//!
//! The [`LocationProvider`] trait is the only way the tracking core reaches
//! the device's positioning hardware. Host applications implement it over
//! their platform location API; tests and the CLI use scripted or replayed
//! implementations.

use std::future::Future;

use thiserror::Error;

use super::state::Sample;

/// Requested fix quality, passed through to the platform provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccuracyHint {
    /// Coarse fixes (cell/Wi-Fi), lowest power draw.
    Low,
    /// Balanced power and accuracy, suitable for delivery tracking.
    #[default]
    Balanced,
    /// Best available accuracy (GPS), highest power draw.
    High,
}

impl std::fmt::Display for AccuracyHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Balanced => write!(f, "balanced"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for AccuracyHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "balanced" => Ok(Self::Balanced),
            "high" => Ok(Self::High),
            other => Err(format!("unknown accuracy hint '{}'", other)),
        }
    }
}

/// Errors a location provider may report for a single capture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The user or platform has not granted location permission.
    #[error("Location permission denied")]
    PermissionDenied,

    /// No fix could be obtained (services disabled, no signal, ...).
    #[error("Location unavailable: {0}")]
    Unavailable(String),

    /// The capture did not complete within the configured timeout.
    #[error("Location request timed out")]
    Timeout,
}

/// Source of device position fixes.
///
/// Implementations should return promptly; the tracking session bounds every
/// call with its own timeout and treats an expired call as
/// [`LocationError::Timeout`].
pub trait LocationProvider: Send + Sync + 'static {
    /// Capture the current device position.
    fn current_position(
        &self,
        accuracy: AccuracyHint,
    ) -> impl Future<Output = Result<Sample, LocationError>> + Send;
}
