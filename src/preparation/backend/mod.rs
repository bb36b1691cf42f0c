//! Cache backend port and its implementations.
//!
//! A backend is a string-keyed store of text payloads with a per-entry
//! expiry. Entries past their expiry read as absent. Backends never merge:
//! a write replaces whatever was stored under the key.

use std::time::{Duration, SystemTime};

use thiserror::Error;

mod memory;
mod sqlite;

pub use memory::InMemoryCacheBackend;
pub use sqlite::SqliteCacheBackend;

#[cfg(any(test, feature = "test-support"))]
pub use memory::ManualClock;

/// Errors raised by cache backends and draft (de)serialisation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The backend could not read or write.
    #[error("cache backend failed: {message}")]
    Backend {
        /// Detail from the backend.
        message: String,
    },

    /// A draft could not be encoded or decoded.
    #[error("cache payload could not be (de)serialised: {message}")]
    Serialisation {
        /// Detail from `serde_json`.
        message: String,
    },
}

/// Key-value store with expiring entries.
#[cfg_attr(test, mockall::automock)]
pub trait CacheBackend: Send + Sync {
    /// Reads a live entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] when the read fails.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Writes an entry that expires `ttl` after now, replacing any previous
    /// value and expiry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] when the write fails.
    fn set_with_expiry(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Removes an entry. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] when the delete fails.
    fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Source of the current time for expiry decisions.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> SystemTime;
}

/// Clock backed by [`SystemTime::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
