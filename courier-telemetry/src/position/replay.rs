//! Replay provider - serves recorded fixes from a JSON lines trace.
//!
//! Each non-empty line is either a fix or a simulated failure:
//!
//! ```text
//! {"latitude": 14.5995, "longitude": 120.9842, "accuracyMeters": 8.0}
//! {"error": "permission_denied"}
//! ```
//!
//! Lines starting with `#` are comments. Fixes are stamped with the capture
//! time when served, so a trace can be replayed through a live tracking
//! session. Once the trace is exhausted every call reports
//! [`LocationError::Unavailable`].

use std::collections::VecDeque;
use std::path::Path;

use parking_lot::Mutex;
use serde::Deserialize;
use thiserror::Error;

use super::provider::{AccuracyHint, LocationError, LocationProvider};
use super::state::{CoordinateError, Sample};

/// Message reported once the trace has no more entries.
pub const REPLAY_EXHAUSTED: &str = "replay trace exhausted";

/// Errors loading a replay trace.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read replay trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Line {line}: {source}")]
    InvalidFix {
        line: usize,
        #[source]
        source: CoordinateError,
    },
}

/// One entry of a replay trace.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayEntry {
    Fix {
        latitude: f64,
        longitude: f64,
        accuracy_meters: f64,
    },
    Failure(LocationError),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Fix {
        latitude: f64,
        longitude: f64,
        #[serde(rename = "accuracyMeters")]
        accuracy_meters: f64,
    },
    Failure {
        error: String,
    },
}

fn failure_from_code(code: &str) -> LocationError {
    match code {
        "permission_denied" => LocationError::PermissionDenied,
        "timeout" => LocationError::Timeout,
        other => LocationError::Unavailable(other.to_string()),
    }
}

/// Parse a JSON lines trace into entries, validating every fix.
pub fn parse_trace(content: &str) -> Result<Vec<ReplayEntry>, ReplayError> {
    let mut entries = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let parsed: ReplayLine =
            serde_json::from_str(trimmed).map_err(|e| ReplayError::Parse {
                line,
                message: e.to_string(),
            })?;

        let entry = match parsed {
            ReplayLine::Fix {
                latitude,
                longitude,
                accuracy_meters,
            } => {
                // Validate up front so a bad trace fails at load, not mid-session
                Sample::now(latitude, longitude, accuracy_meters)
                    .map_err(|source| ReplayError::InvalidFix { line, source })?;
                ReplayEntry::Fix {
                    latitude,
                    longitude,
                    accuracy_meters,
                }
            }
            ReplayLine::Failure { error } => ReplayEntry::Failure(failure_from_code(&error)),
        };
        entries.push(entry);
    }

    Ok(entries)
}

/// Location provider that replays a recorded trace.
pub struct ReplayProvider {
    entries: Mutex<VecDeque<ReplayEntry>>,
}

impl ReplayProvider {
    /// Create a provider from already parsed entries.
    pub fn new(entries: Vec<ReplayEntry>) -> Self {
        Self {
            entries: Mutex::new(entries.into()),
        }
    }

    /// Load a trace from a JSON lines file.
    pub fn from_path(path: &Path) -> Result<Self, ReplayError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(parse_trace(&content)?))
    }

    /// Number of entries not yet served.
    pub fn remaining(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn next_entry(&self) -> Result<Sample, LocationError> {
        match self.entries.lock().pop_front() {
            Some(ReplayEntry::Fix {
                latitude,
                longitude,
                accuracy_meters,
            }) => Sample::now(latitude, longitude, accuracy_meters)
                .map_err(|e| LocationError::Unavailable(e.to_string())),
            Some(ReplayEntry::Failure(error)) => Err(error),
            None => Err(LocationError::Unavailable(REPLAY_EXHAUSTED.to_string())),
        }
    }
}

impl LocationProvider for ReplayProvider {
    async fn current_position(&self, _accuracy: AccuracyHint) -> Result<Sample, LocationError> {
        self.next_entry()
    }
}
