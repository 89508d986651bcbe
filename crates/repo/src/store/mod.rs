//! Entity store port.
//!
//! An entity store is the persistence collaborator a repository delegates
//! to. The repositories never call ORM methods directly; they go through
//! this trait, which [`SeaOrmStore`] implements over sea-orm.

mod orm;

use std::fmt::Display;

use async_trait::async_trait;
use serde_json::{Map, Value};

use common::AppResult;

pub use orm::{RelatedLoader, RelationLoader, SeaOrmStore};

/// Field name/value pairs used for create and update.
pub type Fields = Map<String, Value>;

/// Persistence operations a repository needs from its backing store.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Primary key type
    type Id: Display + Clone + Send + Sync + 'static;

    /// Record type returned by fetches
    type Record: Clone + Send + Sync + 'static;

    /// Unqualified name of the stored entity type
    fn entity_name(&self) -> &str;

    /// Fetch by primary key
    async fn find(&self, id: Self::Id) -> AppResult<Option<Self::Record>>;

    /// Fetch the first record where `field == value`
    async fn find_by_field(&self, field: &str, value: &Value) -> AppResult<Option<Self::Record>>;

    /// Fetch every record ordered ascending by `order_by`
    async fn find_all(&self, order_by: &str) -> AppResult<Vec<Self::Record>>;

    /// Insert a new record
    async fn create(&self, fields: Fields) -> AppResult<Self::Record>;

    /// Assign fields onto a fetched record and persist it
    async fn save(&self, record: Self::Record, fields: Fields) -> AppResult<bool>;

    /// Delete by primary key, returning whether a row was removed
    async fn destroy(&self, id: Self::Id) -> AppResult<bool>;

    /// Eagerly load the named relations onto each record
    async fn load(&self, records: &mut [Self::Record], relations: &[String]) -> AppResult<()>;
}
