//! Backend API errors.

use thiserror::Error;

use crate::endpoint::EndpointError;
use crate::transport::TransportError;

/// Errors from a backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No backend endpoint could be resolved.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    /// The request did not complete. The resolver cache has been invalidated.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not the JSON we expected.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The backend answered `{"success": false}`.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl ApiError {
    /// True if the failure was reaching the backend rather than what it said.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Endpoint(_) | Self::Transport(_))
    }
}
