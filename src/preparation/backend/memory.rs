//! Process-local cache backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use super::{CacheBackend, CacheError, Clock, SystemClock};

#[derive(Debug, Clone)]
struct Entry {
    payload: String,
    expires_at: SystemTime,
}

/// In-memory backend for tests and single-process use.
///
/// Expired entries are dropped lazily when read.
pub struct InMemoryCacheBackend {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryCacheBackend {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl InMemoryCacheBackend {
    /// Creates a backend using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that reads time from `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.entries.lock().map_err(|error| CacheError::Backend {
            message: format!("cache lock poisoned: {error}"),
        })
    }
}

impl CacheBackend for InMemoryCacheBackend {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.payload.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set_with_expiry(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = self.clock.now() + ttl;
        self.lock()?.insert(
            key.to_owned(),
            Entry {
                payload: payload.to_owned(),
                expires_at,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Clock that only moves when told to.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

#[cfg(any(test, feature = "test-support"))]
impl ManualClock {
    /// Starts the clock at `start`.
    #[must_use]
    pub const fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        self.now
            .lock()
            .map_or(SystemTime::UNIX_EPOCH, |now| *now)
    }
}
