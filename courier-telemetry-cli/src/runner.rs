//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization, and construction of
//! the backend client and session store shared by the command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use courier_telemetry::api::TelemetryClient;
use courier_telemetry::config::{config_file_path, ConfigFile};
use courier_telemetry::endpoint::EndpointResolver;
use courier_telemetry::logging::{init_logging, LoggingGuard};
use courier_telemetry::store::JsonFileStore;
use courier_telemetry::transport::ReqwestTransport;
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
    config_path: PathBuf,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// `config_path` overrides the default `~/.courier-telemetry/config.ini`.
    /// Log output is mirrored to stdout only when stdout is not a terminal,
    /// so interactive runs show just the command's own output.
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;

        let stdout_enabled = !atty::is(atty::Stream::Stdout);

        let logging_guard = init_logging(&config.logging.file, stdout_enabled, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Courier Telemetry v{}", courier_telemetry::VERSION);
        info!(
            config = %self.config_path.display(),
            "Courier Telemetry CLI: {} command", command
        );
    }

    /// Build the backend client over a fresh resolver.
    pub fn create_client(&self) -> Result<TelemetryClient<ReqwestTransport>, CliError> {
        let transport = Arc::new(ReqwestTransport::with_timeout(self.config.request_timeout())?);
        let resolver = Arc::new(EndpointResolver::new(
            transport,
            self.config.resolver_config(),
        ));

        info!(
            candidates = resolver.candidates().len(),
            "Backend client created"
        );
        Ok(TelemetryClient::new(resolver).with_request_timeout(self.config.request_timeout()))
    }

    /// Open the session store named by `session.store_file`.
    pub fn create_store(&self) -> Arc<JsonFileStore> {
        Arc::new(JsonFileStore::new(self.config.session.store_file.clone()))
    }
}
