//! Generic repositories over sea-orm with a read-through cache.
//!
//! # Layers
//!
//! - **store**: the [`EntityStore`] persistence port and its sea-orm adapter
//! - **repository**: [`StoreRepository`] (uncached CRUD with eager relation
//!   loading) and [`CachedRepository`] (read-through decorator)
//! - **cache**: the [`CacheStore`] backend port, Redis and in-memory
//!   backends, and the namespacing [`RepoCache`]
//! - **key**: cache key derivation
//!
//! # Usage
//!
//! ```ignore
//! let config = RepoConfig::from_env();
//! let db = Database::connect(&config.database).await?;
//!
//! // Cache keys use the entity name: `users` table → "User". Irregular
//! // plurals need `.named(...)`.
//! let store = SeaOrmStore::<user::Entity, user::ActiveModel>::new(db.get_connection())
//!     .with_relation::<post::Entity>("posts");
//! let users = StoreRepository::with_relations(store, ["posts"]);
//!
//! let cache = RepoCache::from_config(Arc::new(RedisCache::connect(&config.cache).await?), &config.cache);
//! let users = CachedRepository::new(users, cache);
//!
//! let user = users.find_by_id(7).await?;
//! ```

pub mod cache;
pub mod db;
pub mod key;
pub mod loaded;
pub mod repository;
pub mod store;

pub use cache::{CacheStore, MemoryCache, RedisCache, RepoCache};
pub use db::Database;
pub use loaded::Loaded;
pub use repository::{
    CachedRepository, EntityRepository, ReadRepository, Repository, StoreRepository,
    WriteRepository, DEFAULT_ORDER_BY,
};
pub use store::{EntityStore, Fields, RelatedLoader, RelationLoader, SeaOrmStore};

pub use common::{AppError, AppResult, CacheConfig, DatabaseConfig, RepoConfig};

#[cfg(any(test, feature = "test-utils"))]
pub use cache::MockCacheStore;
