//! Caller-supplied update and error callbacks.

use std::sync::Arc;

use super::error::TrackingError;
use crate::position::{Sample, UpdateMetadata};

/// Called with every accepted sample.
pub type UpdateCallback = Arc<dyn Fn(&Sample, &UpdateMetadata) + Send + Sync>;

/// Called with capture and publish failures.
pub type ErrorCallback = Arc<dyn Fn(&TrackingError) + Send + Sync>;

/// Callbacks registered for one active session.
///
/// Callbacks run on the session's clock task while the session lock is held,
/// so they should return quickly. They may call back into the session
/// (`status()`, `stop()`), and none runs after `stop()` has returned.
#[derive(Clone)]
pub struct TrackingCallbacks {
    pub(crate) on_update: UpdateCallback,
    pub(crate) on_error: Option<ErrorCallback>,
}

impl TrackingCallbacks {
    pub fn new<F>(on_update: F) -> Self
    where
        F: Fn(&Sample, &UpdateMetadata) + Send + Sync + 'static,
    {
        Self {
            on_update: Arc::new(on_update),
            on_error: None,
        }
    }

    pub fn with_on_error<F>(mut self, on_error: F) -> Self
    where
        F: Fn(&TrackingError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(on_error));
        self
    }

    pub fn has_error_handler(&self) -> bool {
        self.on_error.is_some()
    }
}

impl std::fmt::Debug for TrackingCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingCallbacks")
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}
