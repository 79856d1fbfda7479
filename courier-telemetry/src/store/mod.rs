//! Local key-value persistence.
//!
//! The tracking session records what it is tracking so it can be resumed
//! after the host app restarts. Storage is pluggable through
//! [`KeyValueStore`]; [`MemoryStore`] suits tests and ephemeral runs, while
//! [`JsonFileStore`] keeps everything in one JSON object on disk.

mod file;
mod memory;
mod resume;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use resume::{ResumeRecord, StoredTrackingConfig, SESSION_KEY};

use thiserror::Error;

/// Errors from a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
