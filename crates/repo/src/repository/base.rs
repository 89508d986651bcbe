//! Base repository traits following Interface Segregation Principle (ISP).
//!
//! Reads and writes are separate traits so a decorator can override one
//! side and forward the other. [`Repository`] combines both and is what
//! callers depend on, whether the implementation is cached or not.

use std::fmt::Display;

use async_trait::async_trait;
use serde_json::Value;

use common::AppResult;

use crate::store::Fields;

/// Column used by [`ReadRepository::list`]
pub const DEFAULT_ORDER_BY: &str = "id";

/// Types and identity shared by the read and write sides.
pub trait EntityRepository: Send + Sync {
    /// Primary key type
    type Id: Display + Clone + Send + Sync + 'static;

    /// Entity type handed to callers
    type Entity: Clone + Send + Sync + 'static;

    /// Unqualified name of the entity type
    fn entity_name(&self) -> &str;
}

/// Read operations (Query) - Single Responsibility
#[async_trait]
pub trait ReadRepository: EntityRepository {
    /// Find entity by primary key, with relations loaded
    async fn find_by_id(&self, id: Self::Id) -> AppResult<Option<Self::Entity>>;

    /// Find the first entity whose `field` equals `value`, with relations loaded
    async fn find_by_field(&self, field: &str, value: Value) -> AppResult<Option<Self::Entity>>;

    /// Find all entities ordered ascending by `order_by`, with relations loaded
    async fn all(&self, order_by: &str) -> AppResult<Vec<Self::Entity>>;

    /// Find all entities ordered by id
    async fn list(&self) -> AppResult<Vec<Self::Entity>> {
        self.all(DEFAULT_ORDER_BY).await
    }
}

/// Write operations (Command) - Single Responsibility
#[async_trait]
pub trait WriteRepository: EntityRepository {
    /// Insert new entity
    async fn create(&self, fields: Fields) -> AppResult<Self::Entity>;

    /// Assign fields onto an existing entity and persist it.
    ///
    /// Fails with `NotFound` if `id` does not exist.
    async fn update(&self, id: Self::Id, fields: Fields) -> AppResult<bool>;

    /// Delete entity by primary key
    async fn destroy(&self, id: Self::Id) -> AppResult<bool>;
}

/// Full CRUD repository - Combines all operations
/// Follows Open/Closed Principle: extend by implementing individual traits
pub trait Repository: ReadRepository + WriteRepository {}

// Auto-implement Repository for types implementing both sides
impl<T> Repository for T where T: ReadRepository + WriteRepository {}
