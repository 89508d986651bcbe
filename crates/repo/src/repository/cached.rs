//! Read-through caching decorator.
//!
//! Reads consult the cache first and populate it on a miss. Writes are
//! forwarded untouched and never invalidate cached reads, so a cached
//! entity can be stale until its TTL runs out.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use common::AppResult;

use super::base::{EntityRepository, ReadRepository, Repository, WriteRepository};
use crate::cache::RepoCache;
use crate::key;
use crate::store::Fields;

/// Repository decorator caching `find_by_id`, `find_by_field` and `all`.
pub struct CachedRepository<R> {
    inner: R,
    cache: RepoCache,
}

impl<R: Repository> CachedRepository<R> {
    pub fn new(inner: R, cache: RepoCache) -> Self {
        Self { inner, cache }
    }

    /// The wrapped repository.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn cache(&self) -> &RepoCache {
        &self.cache
    }

    /// Mutable access for reconfiguring namespace or TTL.
    pub fn cache_mut(&mut self) -> &mut RepoCache {
        &mut self.cache
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Look up a cached payload. Backend failures and undecodable payloads
    /// count as misses.
    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.has(key).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache lookup failed, reading from store");
                return None;
            }
        }

        match self.cache.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, reading from store");
                None
            }
        }
    }

    /// Store a fetched payload under `key` with the configured TTL.
    async fn remember<T: Serialize + Sync>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.put(key, value, None).await {
            tracing::warn!(key = %key, error = %e, "Failed to cache query result");
        }
    }
}

impl<R: Repository> EntityRepository for CachedRepository<R> {
    type Id = R::Id;
    type Entity = R::Entity;

    fn entity_name(&self) -> &str {
        self.inner.entity_name()
    }
}

#[async_trait]
impl<R> ReadRepository for CachedRepository<R>
where
    R: Repository,
    R::Entity: Serialize + DeserializeOwned,
{
    async fn find_by_id(&self, id: R::Id) -> AppResult<Option<R::Entity>> {
        let key = key::id_key(self.entity_name(), &id);

        if let Some(hit) = self.cached(&key).await {
            tracing::debug!(entity = %self.entity_name(), id = %id, "Cache hit");
            return Ok(Some(hit));
        }

        tracing::debug!(entity = %self.entity_name(), id = %id, "Cache miss");
        let found = self.inner.find_by_id(id).await?;
        if let Some(entity) = &found {
            self.remember(&key, entity).await;
        }

        Ok(found)
    }

    async fn find_by_field(&self, field: &str, value: Value) -> AppResult<Option<R::Entity>> {
        let key = key::field_key(self.entity_name(), field, &value);

        if let Some(hit) = self.cached(&key).await {
            tracing::debug!(entity = %self.entity_name(), field = %field, "Cache hit");
            return Ok(Some(hit));
        }

        tracing::debug!(entity = %self.entity_name(), field = %field, "Cache miss");
        let found = self.inner.find_by_field(field, value).await?;
        if let Some(entity) = &found {
            self.remember(&key, entity).await;
        }

        Ok(found)
    }

    async fn all(&self, order_by: &str) -> AppResult<Vec<R::Entity>> {
        let key = key::all_key(self.entity_name(), order_by);

        if let Some(hit) = self.cached(&key).await {
            tracing::debug!(entity = %self.entity_name(), order_by = %order_by, "Cache hit");
            return Ok(hit);
        }

        tracing::debug!(entity = %self.entity_name(), order_by = %order_by, "Cache miss");
        let collection = self.inner.all(order_by).await?;
        self.remember(&key, &collection).await;

        Ok(collection)
    }
}

#[async_trait]
impl<R> WriteRepository for CachedRepository<R>
where
    R: Repository,
{
    async fn create(&self, fields: Fields) -> AppResult<R::Entity> {
        self.inner.create(fields).await
    }

    async fn update(&self, id: R::Id, fields: Fields) -> AppResult<bool> {
        self.inner.update(id, fields).await
    }

    async fn destroy(&self, id: R::Id) -> AppResult<bool> {
        self.inner.destroy(id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use common::AppError;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::cache::{MemoryCache, MockCacheStore};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tag {
        id: u32,
        label: String,
    }

    /// Minimal repository counting how often reads reach it.
    #[derive(Default)]
    struct TagRepository {
        reads: AtomicUsize,
    }

    impl EntityRepository for TagRepository {
        type Id = u32;
        type Entity = Tag;

        fn entity_name(&self) -> &str {
            "Tag"
        }
    }

    #[async_trait]
    impl ReadRepository for TagRepository {
        async fn find_by_id(&self, id: u32) -> AppResult<Option<Tag>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok((id < 100).then(|| Tag {
                id,
                label: format!("tag-{id}"),
            }))
        }

        async fn find_by_field(&self, _field: &str, _value: Value) -> AppResult<Option<Tag>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn all(&self, _order_by: &str) -> AppResult<Vec<Tag>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl WriteRepository for TagRepository {
        async fn create(&self, _fields: Fields) -> AppResult<Tag> {
            Err(AppError::internal("read-only"))
        }

        async fn update(&self, _id: u32, _fields: Fields) -> AppResult<bool> {
            Ok(false)
        }

        async fn destroy(&self, _id: u32) -> AppResult<bool> {
            Ok(false)
        }
    }

    fn broken_store() -> MockCacheStore {
        let mut store = MockCacheStore::new();
        store
            .expect_has()
            .returning(|_| Err(AppError::cache_unavailable("connection refused")));
        store
            .expect_get()
            .returning(|_| Err(AppError::cache_unavailable("connection refused")));
        store
            .expect_put()
            .returning(|_, _, _| Err(AppError::cache_unavailable("connection refused")));
        store
    }

    #[tokio::test]
    async fn test_cache_failure_falls_back_to_inner() {
        let repo = CachedRepository::new(
            TagRepository::default(),
            RepoCache::new(Arc::new(broken_store())),
        );

        let first = repo.find_by_id(3).await.unwrap();
        let second = repo.find_by_id(3).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.unwrap().label, "tag-3");
        assert_eq!(repo.inner().reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_failure_after_has_falls_back() {
        let mut store = MockCacheStore::new();
        store.expect_has().returning(|_| Ok(true));
        store
            .expect_get()
            .returning(|_| Err(AppError::cache_unavailable("timeout")));
        store.expect_put().returning(|_, _, _| Ok(()));

        let repo = CachedRepository::new(TagRepository::default(), RepoCache::new(Arc::new(store)));

        assert!(repo.find_by_id(1).await.unwrap().is_some());
        assert_eq!(repo.inner().reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_a_miss() {
        let mut store = MockCacheStore::new();
        store.expect_has().returning(|_| Ok(true));
        store
            .expect_get()
            .returning(|_| Ok(Some("{\"unexpected\":true}".to_string())));
        store.expect_put().times(1).returning(|_, _, _| Ok(()));

        let repo = CachedRepository::new(TagRepository::default(), RepoCache::new(Arc::new(store)));

        let tag = repo.find_by_id(5).await.unwrap().unwrap();
        assert_eq!(tag.label, "tag-5");
        assert_eq!(repo.inner().reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_absent_results_are_not_cached() {
        let mut store = MockCacheStore::new();
        store.expect_has().returning(|_| Ok(false));
        store.expect_put().never();

        let repo = CachedRepository::new(TagRepository::default(), RepoCache::new(Arc::new(store)));

        assert!(repo.find_by_id(500).await.unwrap().is_none());
        assert!(repo
            .find_by_field("label", json!("missing"))
            .await
            .unwrap()
            .is_none());
        assert_eq!(repo.inner().reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_hit_is_stored_under_derived_key() {
        let cache = RepoCache::new(Arc::new(MemoryCache::new(16).unwrap()));
        let repo = CachedRepository::new(TagRepository::default(), cache.clone());

        repo.find_by_id(9).await.unwrap();

        let key = key::id_key("Tag", &9);
        let cached: Option<Tag> = cache.get(&key).await.unwrap();
        assert_eq!(cached.unwrap().label, "tag-9");
    }

    #[tokio::test]
    async fn test_cache_mut_reconfigures_namespace() {
        let mut repo = CachedRepository::new(
            TagRepository::default(),
            RepoCache::new(Arc::new(MemoryCache::new(16).unwrap())),
        );
        repo.find_by_id(1).await.unwrap();

        repo.cache_mut().set_namespace("other");
        repo.find_by_id(1).await.unwrap();

        assert_eq!(repo.inner().reads.load(Ordering::SeqCst), 2);
    }
}
