//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use courier_telemetry::api::ApiError;
use courier_telemetry::config::ConfigFileError;
use courier_telemetry::endpoint::EndpointError;
use courier_telemetry::position::ReplayError;
use courier_telemetry::store::StoreError;
use courier_telemetry::tracking::TrackingError;
use courier_telemetry::transport::TransportError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to create the HTTP transport
    Transport(TransportError),
    /// Backend request failed
    Api(ApiError),
    /// Failed to load a replay trace
    Replay(ReplayError),
    /// Tracking session error
    Tracking(TrackingError),
    /// Session store error
    Store(StoreError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Api(ApiError::Endpoint(EndpointError::NoReachableEndpoint { .. })) = self
        {
            eprintln!();
            eprintln!("None of the configured backends answered. Check that:");
            eprintln!("  1. The backend server is running");
            eprintln!("  2. This machine is on the same network as the server");
            eprintln!("  3. endpoints.candidates lists the right addresses");
            eprintln!("     (courier-telemetry config get endpoints.candidates)");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Transport(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Api(e) => write!(f, "Backend request failed: {}", e),
            CliError::Replay(e) => write!(f, "Failed to load replay trace: {}", e),
            CliError::Tracking(e) => write!(f, "Tracking failed: {}", e),
            CliError::Store(e) => write!(f, "Session store error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Transport(e) => Some(e),
            CliError::Api(e) => Some(e),
            CliError::Replay(e) => Some(e),
            CliError::Tracking(e) => Some(e),
            CliError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<TransportError> for CliError {
    fn from(e: TransportError) -> Self {
        CliError::Transport(e)
    }
}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        CliError::Api(e)
    }
}

impl From<ReplayError> for CliError {
    fn from(e: ReplayError) -> Self {
        CliError::Replay(e)
    }
}

impl From<TrackingError> for CliError {
    fn from(e: TrackingError) -> Self {
        CliError::Tracking(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}
