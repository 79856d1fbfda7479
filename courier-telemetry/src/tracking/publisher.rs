//! Where accepted samples go after the update callback.

use std::future::Future;

use crate::api::ApiError;
use crate::position::Sample;

/// Sink for accepted samples, typically the backend
/// [`TelemetryClient`](crate::api::TelemetryClient).
pub trait LocationPublisher: Send + Sync + 'static {
    fn publish(
        &self,
        entity_id: &str,
        sample: &Sample,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Publisher that drops every sample. Used when only callbacks matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPublisher;

impl LocationPublisher for NoPublisher {
    async fn publish(&self, _entity_id: &str, _sample: &Sample) -> Result<(), ApiError> {
        Ok(())
    }
}
