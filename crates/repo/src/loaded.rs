//! Records with eagerly loaded relations attached.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use common::{AppError, AppResult};

/// A fetched record together with the relations loaded for it.
///
/// Relations are kept as JSON so the whole value can be cached and
/// restored without knowing the related types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loaded<M> {
    pub model: M,
    #[serde(default)]
    pub relations: BTreeMap<String, Value>,
}

impl<M> Loaded<M> {
    /// Wrap a record with no relations loaded.
    pub fn new(model: M) -> Self {
        Self {
            model,
            relations: BTreeMap::new(),
        }
    }

    /// Attach (or replace) a loaded relation.
    pub fn attach(&mut self, name: impl Into<String>, value: Value) {
        self.relations.insert(name.into(), value);
    }

    /// Whether the named relation has been loaded.
    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// Raw JSON of a loaded relation.
    pub fn relation(&self, name: &str) -> Option<&Value> {
        self.relations.get(name)
    }

    /// Decode a loaded relation into a concrete type.
    pub fn relation_as<T: DeserializeOwned>(&self, name: &str) -> AppResult<Option<T>> {
        self.relations
            .get(name)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| {
                    AppError::internal(format!("Relation `{}` decode error: {}", name, e))
                })
            })
            .transpose()
    }

    pub fn into_inner(self) -> M {
        self.model
    }
}

impl<M> From<M> for Loaded<M> {
    fn from(model: M) -> Self {
        Self::new(model)
    }
}

impl<M> Deref for Loaded<M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.model
    }
}

impl<M> DerefMut for Loaded<M> {
    fn deref_mut(&mut self) -> &mut M {
        &mut self.model
    }
}
