//! Tracking errors surfaced through the error callback.

use thiserror::Error;

use crate::api::ApiError;
use crate::position::LocationError;

/// Errors reported while a session runs, or when starting one.
///
/// Capture and publish failures are delivered to `on_error` and never stop
/// the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
    #[error("Location capture failed: {0}")]
    Location(#[from] LocationError),

    #[error("Location publish failed: {0}")]
    Publish(#[from] ApiError),

    #[error("Invalid tracking configuration: {0}")]
    InvalidConfig(String),
}
