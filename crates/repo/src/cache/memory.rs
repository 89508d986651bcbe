//! In-memory cache backend with LRU eviction.
//!
//! Entries expire lazily: an expired entry is dropped the next time it is
//! looked up. A TTL too large to represent never expires. When `max_entries` is reached the least recently used entry
//! is evicted.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::Mutex;
use tokio::time::Instant;

use common::{AppError, AppResult, CacheConfig};

use super::CacheStore;

/// A single cache entry with its expiration.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process cache backend.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<Mutex<LruCache<String, CacheEntry>>>,
}

impl MemoryCache {
    /// Create a cache holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> AppResult<Self> {
        let capacity = NonZeroUsize::new(max_entries)
            .ok_or_else(|| AppError::validation("Cache capacity must be greater than zero"))?;

        Ok(Self {
            store: Arc::new(Mutex::new(LruCache::new(capacity))),
        })
    }

    /// Create a cache sized from configuration.
    pub fn from_config(config: &CacheConfig) -> AppResult<Self> {
        Self::new(config.max_entries)
    }

    /// Number of entries currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    async fn live(&self, key: &str) -> Option<String> {
        let mut store = self.store.lock().await;

        let expired = match store.get(key) {
            Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            store.pop(key);
        }
        None
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn has(&self, key: &str) -> AppResult<bool> {
        Ok(self.live(key).await.is_some())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.live(key).await)
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> AppResult<()> {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now().checked_add(ttl),
        };

        self.store.lock().await.put(key.to_string(), entry);
        Ok(())
    }
}
