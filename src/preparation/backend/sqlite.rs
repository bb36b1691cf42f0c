//! Cache backend stored in the `draft_cache` table.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};

use crate::persistence::PersistenceError;
use crate::persistence::connection::{
    establish_connection, map_query_error, map_write_error, validated_database_url,
};

use super::{CacheBackend, CacheError, Clock, SystemClock};

const DRAFT_CACHE_TABLE: &str = "draft_cache";

/// SQLite-backed cache so drafts survive between CLI invocations.
pub struct SqliteCacheBackend {
    database_url: String,
    clock: Arc<dyn Clock>,
}

impl SqliteCacheBackend {
    /// Creates a backend targeting `database_url` with the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(database_url: impl Into<String>) -> Result<Self, PersistenceError> {
        Self::with_clock(database_url, Arc::new(SystemClock))
    }

    /// Creates a backend that reads time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] when the URL is blank.
    pub fn with_clock(
        database_url: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PersistenceError> {
        Ok(Self {
            database_url: validated_database_url(database_url)?,
            clock,
        })
    }

    fn now_unix(&self) -> i64 {
        unix_seconds(self.clock.now())
    }
}

fn unix_seconds(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|duration| i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn backend_error(error: &PersistenceError) -> CacheError {
    CacheError::Backend {
        message: error.to_string(),
    }
}

impl CacheBackend for SqliteCacheBackend {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = Text)]
            payload: String,
        }

        let mut connection =
            establish_connection(&self.database_url).map_err(|error| backend_error(&error))?;

        sql_query(
            "SELECT payload FROM draft_cache WHERE key = ? AND expires_at_unix > ? LIMIT 1;",
        )
        .bind::<Text, _>(key)
        .bind::<BigInt, _>(self.now_unix())
        .get_result::<Row>(&mut connection)
        .optional()
        .map(|row| row.map(|found| found.payload))
        .map_err(|error| backend_error(&map_query_error(&mut connection, DRAFT_CACHE_TABLE, &error)))
    }

    fn set_with_expiry(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = unix_seconds(self.clock.now() + ttl);
        let mut connection =
            establish_connection(&self.database_url).map_err(|error| backend_error(&error))?;

        sql_query(
            "INSERT INTO draft_cache (key, payload, expires_at_unix) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET \
               payload = excluded.payload, \
               expires_at_unix = excluded.expires_at_unix, \
               updated_at = CURRENT_TIMESTAMP;",
        )
        .bind::<Text, _>(key)
        .bind::<Text, _>(payload)
        .bind::<BigInt, _>(expires_at)
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| backend_error(&map_write_error(&mut connection, DRAFT_CACHE_TABLE, &error)))
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut connection =
            establish_connection(&self.database_url).map_err(|error| backend_error(&error))?;

        sql_query("DELETE FROM draft_cache WHERE key = ?;")
            .bind::<Text, _>(key)
            .execute(&mut connection)
            .map(drop)
            .map_err(|error| {
                backend_error(&map_write_error(&mut connection, DRAFT_CACHE_TABLE, &error))
            })
    }
}
