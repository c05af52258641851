//! Keyed summary cache with expiry.
//!
//! Values are written once per video and never change afterwards, so
//! last-writer-wins without any locking across processes is fine.

use crate::config::Settings;
use crate::error::{Result, VidaskError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Cached payload for one video, stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSummary {
    pub summary: String,
}

/// Cache key for a video's summary.
pub fn summary_key(video_id: &str) -> String {
    format!("video:{}:summary", video_id)
}

/// Trait for string caches with per-entry expiry.
#[async_trait]
pub trait SummaryCache: Send + Sync {
    /// Get a value if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

fn poisoned<E: std::fmt::Display>(e: E) -> VidaskError {
    VidaskError::Cache(format!("Cache lock poisoned: {}", e))
}

fn expiry_from_now(ttl: Duration) -> Result<DateTime<Utc>> {
    let ttl = chrono::Duration::from_std(ttl).map_err(|e| VidaskError::Cache(e.to_string()))?;
    Ok(Utc::now() + ttl)
}

/// In-memory cache.
///
/// Useful for testing and single-process servers.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SummaryCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let expires_at = expiry_from_now(ttl)?;
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.retain(|_, (_, exp)| *exp > Utc::now());
        entries.insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }
}

const CACHE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS cache (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        expires_at INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_cache_expires_at ON cache(expires_at);
"#;

/// SQLite-backed cache that survives restarts.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open (or create) a cache database.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(CACHE_SCHEMA)?;

        info!("Initialized SQLite cache at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CACHE_SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Delete expired rows, returning how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(poisoned)?;
        let removed = conn.execute(
            "DELETE FROM cache WHERE expires_at <= ?1",
            params![Utc::now().timestamp_millis()],
        )?;
        Ok(removed)
    }
}

#[async_trait]
impl SummaryCache for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().map_err(poisoned)?;
        let value = conn
            .query_row(
                "SELECT value FROM cache WHERE key = ?1 AND expires_at > ?2",
                params![key, Utc::now().timestamp_millis()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let expires_at = expiry_from_now(ttl)?.timestamp_millis();
        {
            let conn = self.conn.lock().map_err(poisoned)?;
            conn.execute(
                "INSERT OR REPLACE INTO cache (key, value, expires_at) VALUES (?1, ?2, ?3)",
                params![key, value, expires_at],
            )?;
        }
        let purged = self.purge_expired()?;
        if purged > 0 {
            debug!("Purged {} expired cache entries", purged);
        }
        Ok(())
    }
}

/// Create the configured cache, or `None` when caching is disabled.
pub fn create_cache(settings: &Settings) -> Result<Option<Arc<dyn SummaryCache>>> {
    match settings.cache.provider.to_lowercase().as_str() {
        "sqlite" => Ok(Some(Arc::new(SqliteCache::new(&settings.cache_path())?))),
        "memory" => Ok(Some(Arc::new(MemoryCache::new()))),
        "none" | "" => Ok(None),
        other => Err(VidaskError::Config(format!("Unknown cache provider: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 3600);

    #[test]
    fn test_summary_key() {
        assert_eq!(summary_key("dQw4w9WgXcQ"), "video:dQw4w9WgXcQ:summary");
    }

    #[test]
    fn test_cached_summary_json_shape() {
        let json = serde_json::to_string(&CachedSummary {
            summary: "hi".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"summary":"hi"}"#);
    }

    #[tokio::test]
    async fn test_memory_cache_roundtrip_and_expiry() {
        let cache = MemoryCache::new();
        cache.set("k", "v", WEEK).await.unwrap();
        cache.set("gone", "v", Duration::ZERO).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(cache.get("gone").await.unwrap(), None);
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_cache_overwrite_and_expiry() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.set("k", "first", WEEK).await.unwrap();
        cache.set("k", "second", WEEK).await.unwrap();
        cache.set("gone", "v", Duration::ZERO).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some("second".to_string()));
        assert_eq!(cache.get("gone").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_cache_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.db");

        SqliteCache::new(&path)
            .unwrap()
            .set("k", "kept", WEEK)
            .await
            .unwrap();

        let reopened = SqliteCache::new(&path).unwrap();
        assert_eq!(reopened.get("k").await.unwrap(), Some("kept".to_string()));
    }

    #[test]
    fn test_create_cache_providers() {
        let mut settings = Settings::default();
        settings.cache.provider = "none".to_string();
        assert!(create_cache(&settings).unwrap().is_none());

        settings.cache.provider = "memory".to_string();
        assert!(create_cache(&settings).unwrap().is_some());

        settings.cache.provider = "redis".to_string();
        assert!(create_cache(&settings).is_err());
    }

    #[tokio::test]
    async fn test_poisoned_memory_cache_reports_error() {
        let cache = Arc::new(MemoryCache::new());
        let held = cache.clone();
        let _ = std::thread::spawn(move || {
            let _guard = held.entries.write().unwrap();
            panic!("writer died");
        })
        .join();

        assert!(matches!(cache.get("k").await, Err(VidaskError::Cache(_))));
        assert!(matches!(cache.set("k", "v", WEEK).await, Err(VidaskError::Cache(_))));
    }

    #[tokio::test]
    async fn test_poisoned_sqlite_cache_reports_error() {
        let cache = Arc::new(SqliteCache::in_memory().unwrap());
        let held = cache.clone();
        let _ = std::thread::spawn(move || {
            let _guard = held.conn.lock().unwrap();
            panic!("writer died");
        })
        .join();

        assert!(matches!(cache.get("k").await, Err(VidaskError::Cache(_))));
        assert!(matches!(cache.purge_expired(), Err(VidaskError::Cache(_))));
    }
}
