//! Uncached repository over an entity store.

use async_trait::async_trait;
use serde_json::Value;

use common::{AppResult, OptionExt};

use super::base::{EntityRepository, ReadRepository, WriteRepository};
use crate::store::{EntityStore, Fields};

/// Repository that forwards to an [`EntityStore`] and eagerly loads a
/// fixed list of relations on every read.
pub struct StoreRepository<S> {
    store: S,
    relations: Vec<String>,
}

impl<S: EntityStore> StoreRepository<S> {
    /// Create a repository that loads no relations.
    pub fn new(store: S) -> Self {
        Self {
            store,
            relations: Vec::new(),
        }
    }

    /// Create a repository that loads `relations` on every read.
    pub fn with_relations<I, N>(store: S, relations: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            store,
            relations: relations.into_iter().map(Into::into).collect(),
        }
    }

    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn attach(&self, records: &mut [S::Record]) -> AppResult<()> {
        if self.relations.is_empty() {
            return Ok(());
        }
        self.store.load(records, &self.relations).await
    }
}

impl<S: EntityStore> EntityRepository for StoreRepository<S> {
    type Id = S::Id;
    type Entity = S::Record;

    fn entity_name(&self) -> &str {
        self.store.entity_name()
    }
}

#[async_trait]
impl<S: EntityStore> ReadRepository for StoreRepository<S> {
    async fn find_by_id(&self, id: S::Id) -> AppResult<Option<S::Record>> {
        let Some(mut record) = self.store.find(id).await? else {
            return Ok(None);
        };

        self.attach(std::slice::from_mut(&mut record)).await?;
        Ok(Some(record))
    }

    async fn find_by_field(&self, field: &str, value: Value) -> AppResult<Option<S::Record>> {
        let Some(mut record) = self.store.find_by_field(field, &value).await? else {
            return Ok(None);
        };

        self.attach(std::slice::from_mut(&mut record)).await?;
        Ok(Some(record))
    }

    async fn all(&self, order_by: &str) -> AppResult<Vec<S::Record>> {
        let mut records = self.store.find_all(order_by).await?;
        self.attach(&mut records).await?;
        Ok(records)
    }
}

#[async_trait]
impl<S: EntityStore> WriteRepository for StoreRepository<S> {
    async fn create(&self, fields: Fields) -> AppResult<S::Record> {
        self.store.create(fields).await
    }

    async fn update(&self, id: S::Id, fields: Fields) -> AppResult<bool> {
        let record = self.store.find(id).await?.ok_or_not_found()?;
        self.store.save(record, fields).await
    }

    async fn destroy(&self, id: S::Id) -> AppResult<bool> {
        self.store.destroy(id).await
    }
}
