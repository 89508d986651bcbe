//! Cache port used by the cached repository.
//!
//! [`CacheStore`] is the raw key/value backend (Redis or in-process).
//! [`RepoCache`] wraps a backend with a namespace prefix, a default TTL
//! in minutes and JSON (de)serialization of payloads.

mod memory;
mod redis_cache;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use common::{AppError, AppResult, CacheConfig, DEFAULT_CACHE_NAMESPACE, DEFAULT_CACHE_TTL_MINUTES};

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Raw key/value backend for cached payloads.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Check if a live entry exists
    async fn has(&self, key: &str) -> AppResult<bool>;

    /// Get a live entry
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store an entry that expires after `ttl`
    async fn put(&self, key: &str, value: String, ttl: Duration) -> AppResult<()>;
}

/// Namespaced, TTL-aware cache port.
#[derive(Clone)]
pub struct RepoCache {
    store: Arc<dyn CacheStore>,
    namespace: String,
    minutes: u64,
}

impl RepoCache {
    /// Create a cache port with the default namespace and TTL.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            namespace: DEFAULT_CACHE_NAMESPACE.to_string(),
            minutes: DEFAULT_CACHE_TTL_MINUTES,
        }
    }

    /// Create a cache port using the configured namespace and TTL.
    pub fn from_config(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            namespace: config.namespace.clone(),
            minutes: config.default_ttl_minutes,
        }
    }

    /// Rebuild with a different namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Rebuild with a different default TTL.
    pub fn with_minutes(mut self, minutes: u64) -> Self {
        self.minutes = minutes;
        self
    }

    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.namespace = namespace.into();
    }

    pub fn set_minutes(&mut self, minutes: u64) {
        self.minutes = minutes;
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn minutes(&self) -> u64 {
        self.minutes
    }

    /// Check if a key exists in cache.
    pub async fn has(&self, key: &str) -> AppResult<bool> {
        self.store.has(&self.namespaced(key)).await
    }

    /// Get a value from cache.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let Some(json) = self.store.get(&self.namespaced(key)).await? else {
            return Ok(None);
        };

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| AppError::internal(format!("Cache deserialization error: {}", e)))
    }

    /// Set a value in cache, with the default TTL when `minutes` is `None`.
    ///
    /// A TTL of zero minutes stores nothing.
    pub async fn put<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        minutes: Option<u64>,
    ) -> AppResult<()> {
        let minutes = minutes.unwrap_or(self.minutes);
        if minutes == 0 {
            tracing::debug!(key = %key, "Zero TTL, entry not stored");
            return Ok(());
        }

        let json = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("Cache serialization error: {}", e)))?;

        let ttl = Duration::from_secs(minutes.saturating_mul(60));
        self.store.put(&self.namespaced(key), json, ttl).await
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}.{}", self.namespace, key)
    }
}

impl std::fmt::Debug for RepoCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoCache")
            .field("namespace", &self.namespace)
            .field("minutes", &self.minutes)
            .finish()
    }
}
