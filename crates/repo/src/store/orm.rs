//! sea-orm implementation of the entity store port.

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, ModelTrait, PrimaryKeyTrait, QueryFilter, QueryOrder, Related,
    TryIntoModel,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use common::{AppError, AppResult};

use super::{EntityStore, Fields};
use crate::loaded::Loaded;

/// Loads one named relation for a single model.
#[async_trait]
pub trait RelationLoader<M>: Send + Sync {
    async fn load(&self, db: &DatabaseConnection, model: &M) -> AppResult<Value>;
}

/// Loads the `R` records related to a model through its `Related<R>` definition.
pub struct RelatedLoader<R> {
    single: bool,
    _marker: PhantomData<fn() -> R>,
}

impl<R> RelatedLoader<R> {
    /// Load every related record as a JSON array (has-many).
    pub fn many() -> Self {
        Self {
            single: false,
            _marker: PhantomData,
        }
    }

    /// Load the first related record as a JSON object or null (has-one, belongs-to).
    pub fn one() -> Self {
        Self {
            single: true,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<M, R> RelationLoader<M> for RelatedLoader<R>
where
    M: ModelTrait + Sync,
    <M as ModelTrait>::Entity: Related<R>,
    R: EntityTrait,
    R::Model: Serialize + Send + Sync,
{
    async fn load(&self, db: &DatabaseConnection, model: &M) -> AppResult<Value> {
        let value = if self.single {
            let related = model.find_related(R::default()).one(db).await?;
            serde_json::to_value(related)
        } else {
            let related = model.find_related(R::default()).all(db).await?;
            serde_json::to_value(related)
        };

        value.map_err(|e| AppError::internal(format!("Relation serialization error: {}", e)))
    }
}

/// Entity store backed by a sea-orm entity.
///
/// `E` is the sea-orm entity and `A` its active model. Every sea-orm entity
/// type is named `Entity`, so the store names itself after its table
/// (`users` → `User`) unless renamed with [`SeaOrmStore::named`].
pub struct SeaOrmStore<E, A>
where
    E: EntityTrait,
{
    db: DatabaseConnection,
    name: String,
    loaders: HashMap<String, Arc<dyn RelationLoader<E::Model>>>,
    _marker: PhantomData<fn() -> A>,
}

impl<E, A> SeaOrmStore<E, A>
where
    E: EntityTrait,
{
    /// Create new store instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            name: entity_name_for_table(E::default().table_name()),
            loaders: HashMap::new(),
            _marker: PhantomData,
        }
    }

    /// Override the entity name used in cache keys. Defaults to the
    /// singular PascalCase form of the table name (`blog_posts` → `BlogPost`).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Register a has-many relation under `name`.
    pub fn with_relation<R>(self, name: impl Into<String>) -> Self
    where
        E: Related<R>,
        E::Model: Sync,
        R: EntityTrait,
        R::Model: Serialize + Send + Sync,
    {
        self.with_loader(name, RelatedLoader::<R>::many())
    }

    /// Register a to-one relation under `name`.
    pub fn with_single_relation<R>(self, name: impl Into<String>) -> Self
    where
        E: Related<R>,
        E::Model: Sync,
        R: EntityTrait,
        R::Model: Serialize + Send + Sync,
    {
        self.with_loader(name, RelatedLoader::<R>::one())
    }

    /// Register a custom loader under `name`.
    pub fn with_loader(
        mut self,
        name: impl Into<String>,
        loader: impl RelationLoader<E::Model> + 'static,
    ) -> Self {
        self.loaders.insert(name.into(), Arc::new(loader));
        self
    }

    /// Get database connection reference
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    fn column(&self, field: &str) -> AppResult<E::Column> {
        E::Column::from_str(field).map_err(|_| {
            AppError::validation(format!("Unknown column `{}` on {}", field, self.name))
        })
    }
}

#[async_trait]
impl<E, A> EntityStore for SeaOrmStore<E, A>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<A> + Serialize + DeserializeOwned + Sync + 'static,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + TryIntoModel<E::Model> + Send + 'static,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: Display + Clone + Sync + Debug + 'static,
{
    type Id = <E::PrimaryKey as PrimaryKeyTrait>::ValueType;
    type Record = Loaded<E::Model>;

    fn entity_name(&self) -> &str {
        &self.name
    }

    async fn find(&self, id: Self::Id) -> AppResult<Option<Self::Record>> {
        let model = E::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Loaded::new))
    }

    async fn find_by_field(&self, field: &str, value: &Value) -> AppResult<Option<Self::Record>> {
        let column = self.column(field)?;
        let condition = match value {
            Value::Null => column.is_null(),
            other => column.eq(query_value(other)),
        };

        let model = E::find().filter(condition).one(&self.db).await?;
        Ok(model.map(Loaded::new))
    }

    async fn find_all(&self, order_by: &str) -> AppResult<Vec<Self::Record>> {
        let column = self.column(order_by)?;
        let models = E::find().order_by_asc(column).all(&self.db).await?;
        Ok(models.into_iter().map(Loaded::new).collect())
    }

    async fn create(&self, fields: Fields) -> AppResult<Self::Record> {
        let active = A::from_json(Value::Object(fields))?;
        let model = active.insert(&self.db).await?;
        Ok(Loaded::new(model))
    }

    async fn save(&self, record: Self::Record, fields: Fields) -> AppResult<bool> {
        if fields.is_empty() {
            return Ok(true);
        }

        // Overlay the new values on the current row so partial updates deserialize.
        let mut merged = match serde_json::to_value(&record.model) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(AppError::internal("Model did not serialize to an object")),
            Err(e) => return Err(AppError::internal(format!("Model serialization error: {}", e))),
        };
        merged.extend(fields);

        let mut active: A = record.model.into_active_model();
        active.set_from_json(Value::Object(merged))?;

        match active.update(&self.db).await {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotUpdated) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn destroy(&self, id: Self::Id) -> AppResult<bool> {
        let result = E::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn load(&self, records: &mut [Self::Record], relations: &[String]) -> AppResult<()> {
        for name in relations {
            let loader = self.loaders.get(name).ok_or_else(|| {
                AppError::validation(format!("Unknown relation `{}` on {}", name, self.name))
            })?;

            for record in records.iter_mut() {
                let value = loader.load(&self.db, &record.model).await?;
                record.attach(name.clone(), value);
            }
        }

        Ok(())
    }
}

/// Convert a JSON filter value into a bindable query value.
fn query_value(value: &Value) -> sea_orm::Value {
    match value {
        Value::Bool(b) => (*b).into(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into()
            } else if let Some(u) = n.as_u64() {
                u.into()
            } else {
                n.as_f64().unwrap_or_default().into()
            }
        }
        Value::String(s) => s.clone().into(),
        other => other.clone().into(),
    }
}

/// Singular PascalCase entity name for a snake_case plural table name.
fn entity_name_for_table(table: &str) -> String {
    let singular = if let Some(stem) = table.strip_suffix("ies") {
        format!("{stem}y")
    } else if table.ends_with("ss") {
        table.to_owned()
    } else {
        table.strip_suffix('s').unwrap_or(table).to_owned()
    };

    singular
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
