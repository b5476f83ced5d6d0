//! Cache service for search responses
//!
//! Defines the capability set callers may wrap around provider searches and an
//! in-memory implementation with LRU eviction and per-entry expiry. Values are
//! stored as serialized JSON so the trait stays object safe; typed access goes
//! through [`CacheServiceExt`].

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CoreError;
use crate::config::CacheConfig;

/// Key/value cache with optional per-entry time-to-live.
#[async_trait]
pub trait CacheService: Send + Sync + std::fmt::Debug {
    /// Returns the stored JSON for `key`, or `None` if absent or expired.
    async fn get_raw(&self, key: &str) -> Option<String>;

    /// Stores JSON under `key`. `ttl` of `None` uses the cache default.
    ///
    /// # Errors
    /// - `CoreError::Cache` - The backend rejected the write
    async fn set_raw(&self, key: &str, value: String, ttl: Option<Duration>)
    -> Result<(), CoreError>;

    /// Removes `key` if present.
    async fn delete(&self, key: &str);

    /// Removes every entry.
    async fn flush_all(&self);

    /// Whether the backend can currently serve requests.
    fn is_available(&self) -> bool;
}

/// Typed access on top of any [`CacheService`].
#[async_trait]
pub trait CacheServiceExt: CacheService {
    /// Fetches and deserializes a value. Entries that no longer deserialize are treated as misses.
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Dropping undecodable cache entry {key}: {e}");
                self.delete(key).await;
                None
            }
        }
    }

    /// Serializes and stores a value.
    ///
    /// # Errors
    /// - `CoreError::Cache` - Serialization failed or the backend rejected the write
    async fn set<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CoreError> {
        let raw = serde_json::to_string(value).map_err(|e| CoreError::Cache {
            reason: format!("failed to serialize value for {key}: {e}"),
        })?;
        self.set_raw(key, raw, ttl).await
    }
}

impl<C: CacheService + ?Sized> CacheServiceExt for C {}

#[derive(Debug)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process cache backed by an LRU map.
#[derive(Debug)]
pub struct MemoryCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    default_ttl: Duration,
}

impl MemoryCache {
    /// Creates a cache holding at most `capacity` entries (minimum one).
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            default_ttl,
        }
    }

    /// Creates a cache sized from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl)
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_raw(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        let expired = entries.peek(key)?.is_expired(now);
        if expired {
            entries.pop(key);
            return None;
        }

        entries.get(key).map(|entry| entry.value.clone())
    }

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CoreError> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl.is_zero() {
            return Err(CoreError::Cache {
                reason: format!("refusing to store {key} with zero ttl"),
            });
        }

        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().put(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) {
        self.entries.lock().pop(key);
    }

    async fn flush_all(&self) {
        self.entries.lock().clear();
    }

    fn is_available(&self) -> bool {
        true
    }
}
