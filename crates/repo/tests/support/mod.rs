//! Shared fixtures: a call-counting in-memory entity store.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use repo::key::short_type_name;
use repo::{AppError, AppResult, EntityStore, Fields, Loaded};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

pub fn user(id: i64, name: &str) -> User {
    User {
        id,
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

/// In-memory store that counts every call reaching it.
#[derive(Default)]
pub struct CountingStore {
    rows: Mutex<BTreeMap<i64, User>>,
    next_id: AtomicI64,
    pub finds: AtomicUsize,
    pub field_finds: AtomicUsize,
    pub list_finds: AtomicUsize,
    pub loads: AtomicUsize,
    pub saves: AtomicUsize,
}

impl CountingStore {
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::default();
        let mut max_id = 0;
        {
            let mut rows = store.rows.lock().unwrap();
            for user in users {
                max_id = max_id.max(user.id);
                rows.insert(user.id, user);
            }
        }
        store.next_id.store(max_id, Ordering::SeqCst);
        store
    }

    pub fn row(&self, id: i64) -> Option<User> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn column(user: &User, field: &str) -> Option<Value> {
    serde_json::to_value(user).ok()?.get(field).cloned()
}

#[async_trait]
impl EntityStore for CountingStore {
    type Id = i64;
    type Record = Loaded<User>;

    fn entity_name(&self) -> &str {
        short_type_name::<User>()
    }

    async fn find(&self, id: i64) -> AppResult<Option<Loaded<User>>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        Ok(self.row(id).map(Loaded::new))
    }

    async fn find_by_field(&self, field: &str, value: &Value) -> AppResult<Option<Loaded<User>>> {
        self.field_finds.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .find(|user| column(user, field).as_ref() == Some(value))
            .cloned()
            .map(Loaded::new))
    }

    async fn find_all(&self, order_by: &str) -> AppResult<Vec<Loaded<User>>> {
        self.list_finds.fetch_add(1, Ordering::SeqCst);
        let mut users: Vec<User> = self.rows.lock().unwrap().values().cloned().collect();
        match order_by {
            "id" => users.sort_by_key(|u| u.id),
            "name" => users.sort_by(|a, b| a.name.cmp(&b.name)),
            "email" => users.sort_by(|a, b| a.email.cmp(&b.email)),
            other => return Err(AppError::validation(format!("Unknown column `{other}`"))),
        }
        Ok(users.into_iter().map(Loaded::new).collect())
    }

    async fn create(&self, mut fields: Fields) -> AppResult<Loaded<User>> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        fields.insert("id".into(), json!(id));
        let user: User = serde_json::from_value(Value::Object(fields))
            .map_err(|e| AppError::validation(e.to_string()))?;
        self.rows.lock().unwrap().insert(id, user.clone());
        Ok(Loaded::new(user))
    }

    async fn save(&self, record: Loaded<User>, fields: Fields) -> AppResult<bool> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut current = match serde_json::to_value(record.into_inner()) {
            Ok(Value::Object(map)) => map,
            _ => return Ok(false),
        };
        current.extend(fields);
        let user: User = serde_json::from_value(Value::Object(current))
            .map_err(|e| AppError::validation(e.to_string()))?;
        self.rows.lock().unwrap().insert(user.id, user);
        Ok(true)
    }

    async fn destroy(&self, id: i64) -> AppResult<bool> {
        Ok(self.rows.lock().unwrap().remove(&id).is_some())
    }

    async fn load(&self, records: &mut [Loaded<User>], relations: &[String]) -> AppResult<()> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        for relation in relations {
            for record in records.iter_mut() {
                let value = match relation.as_str() {
                    "posts" => json!([{ "title": format!("First post by {}", record.name) }]),
                    "profile" => json!({ "bio": format!("{} writes things", record.name) }),
                    other => {
                        return Err(AppError::validation(format!("Unknown relation `{other}`")))
                    }
                };
                record.attach(relation.clone(), value);
            }
        }
        Ok(())
    }
}
