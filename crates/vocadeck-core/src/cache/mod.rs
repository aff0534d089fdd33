//! Persistent image result cache
//!
//! SQLite-backed key -> `{image_url, credit, timestamp}` store with:
//! - 24h expiration, purged lazily at the start of each fetch
//! - size bound, evicting oldest-by-insertion first
//! - SHA-256 keys over query, request parameters and candidate text

use crate::error::Result;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Entries at least this old are never returned
pub const CACHE_EXPIRATION_SECS: f64 = 24.0 * 60.0 * 60.0;

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS image_cache (
    key TEXT PRIMARY KEY,
    image_url TEXT NOT NULL,
    credit TEXT NOT NULL,
    timestamp REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_image_cache_timestamp ON image_cache(timestamp);
"#;

/// One cached lookup result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub image_url: String,
    pub credit: String,
    /// Seconds since the Unix epoch at insertion
    pub timestamp: f64,
}

impl CacheEntry {
    pub fn new(image_url: impl Into<String>, credit: impl Into<String>, timestamp: f64) -> Self {
        Self {
            image_url: image_url.into(),
            credit: credit.into(),
            timestamp,
        }
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now - self.timestamp >= CACHE_EXPIRATION_SECS
    }
}

/// Cache statistics
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Current wall-clock time as float epoch seconds
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Cache key for one candidate query of one lookup
pub fn cache_key(base_query: &str, serialized_params: &str, candidate: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base_query.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(serialized_params.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(candidate.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// File-backed result cache
pub struct ImageCache {
    conn: Connection,
}

impl ImageCache {
    /// Open cache at path, creating if necessary
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize()?;
        Ok(cache)
    }

    /// Open the cache, falling back to an empty in-memory cache if the file is unusable
    pub fn open_or_empty(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(cache) => Ok(cache),
            Err(e) => {
                tracing::warn!(
                    "Image cache at {:?} is unreadable ({}), continuing with an empty cache",
                    path,
                    e
                );
                Self::open_in_memory()
            }
        }
    }

    /// Open in-memory cache (for testing and fallback)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize()?;
        Ok(cache)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        self.conn.execute_batch(CREATE_TABLES)?;
        Ok(())
    }

    /// Look up a key; expired or vanished entries read as a miss
    pub fn get(&self, key: &str, now: f64) -> Result<Option<CacheEntry>> {
        let result = self.conn.query_row(
            "SELECT image_url, credit, timestamp FROM image_cache WHERE key = ?1",
            params![key],
            |row| {
                Ok(CacheEntry {
                    image_url: row.get(0)?,
                    credit: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            },
        );

        match result {
            Ok(entry) if entry.is_expired(now) => Ok(None),
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert or replace an entry; a replaced entry counts as newly inserted
    pub fn put(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO image_cache (key, image_url, credit, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, entry.image_url, entry.credit, entry.timestamp],
        )?;
        Ok(())
    }

    /// Remove every entry with `now - timestamp >= 24h`
    pub fn purge_expired(&self, now: f64) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM image_cache WHERE ?1 - timestamp >= ?2",
            params![now, CACHE_EXPIRATION_SECS],
        )?;
        if rows > 0 {
            tracing::debug!("Purged {} expired cache entries", rows);
        }
        Ok(rows)
    }

    /// Evict oldest entries until at most `max_size` remain
    ///
    /// Ties on timestamp are broken by insertion order.
    pub fn enforce_size_limit(&self, max_size: usize) -> Result<usize> {
        let count = self.len()?;
        if count <= max_size {
            return Ok(0);
        }

        let excess = (count - max_size) as i64;
        let rows = self.conn.execute(
            "DELETE FROM image_cache WHERE rowid IN (
                SELECT rowid FROM image_cache ORDER BY timestamp ASC, rowid ASC LIMIT ?1
             )",
            params![excess],
        )?;
        tracing::debug!("Evicted {} cache entries (limit {})", rows, max_size);
        Ok(rows)
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM image_cache", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether a key is stored, regardless of age
    pub fn contains(&self, key: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM image_cache WHERE key = ?1)",
            params![key],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Clear all entries
    pub fn clear(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM image_cache", [])?)
    }

    /// Get cache statistics
    pub fn stats(&self, now: f64) -> Result<CacheStats> {
        let total = self.len()?;
        let expired: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM image_cache WHERE ?1 - timestamp >= ?2",
            params![now, CACHE_EXPIRATION_SECS],
            |row| row.get(0),
        )?;
        let expired = expired as usize;

        Ok(CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        })
    }
}
