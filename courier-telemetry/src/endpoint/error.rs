//! Endpoint resolution errors.

use thiserror::Error;

/// Errors returned by [`EndpointResolver::resolve`](super::EndpointResolver::resolve).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// Every candidate failed its probe. The cache stays empty, so the next
    /// resolve probes again from the first candidate.
    #[error("No reachable endpoint ({attempted} candidates probed)")]
    NoReachableEndpoint { attempted: usize },

    /// The caller driving the probe pass went away before it finished.
    #[error("Endpoint probe was abandoned before completing")]
    ProbeAbandoned,
}
