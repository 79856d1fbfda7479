//! User configuration stored in `~/.courier-telemetry/config.ini`.
//!
//! # Example
//!
//! ```no_run
//! use courier_telemetry::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let tracking = config.tracking_config();
//! let resolver = config.resolver_config();
//! # Ok::<(), courier_telemetry::config::ConfigFileError>(())
//! ```

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    default_log_file, default_store_file, CONFIG_DIR_NAME, DEFAULT_PROBE_TIMEOUT_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{ConfigFile, EndpointSettings, LoggingSettings, SessionSettings, TrackingSettings};
