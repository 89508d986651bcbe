//! Cache key derivation.
//!
//! A key is the hex SHA-256 digest of the entity name concatenated with an
//! operation-specific suffix. Same entity, operation and parameters always
//! produce the same key.

use std::fmt::Display;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Key for a primary-key lookup: `digest(entity + id)`.
pub fn id_key(entity: &str, id: &impl Display) -> String {
    digest(&format!("{entity}{id}"))
}

/// Key for a field-equality lookup: `digest(entity + "field." + field + "=" + value)`.
pub fn field_key(entity: &str, field: &str, value: &Value) -> String {
    digest(&format!("{entity}field.{field}={}", value_text(value)))
}

/// Key for an ordered listing: `digest(entity + "all.orderedBy" + order_by)`.
pub fn all_key(entity: &str, order_by: &str) -> String {
    digest(&format!("{entity}all.orderedBy{order_by}"))
}

/// Unqualified name of a type, without module path or generic arguments.
///
/// `my_app::models::User` becomes `User`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// Marks non-string values. JSON text never starts with it, and strings
// that do are escaped with a second one, so the mapping stays injective.
const TAG: char = '\u{1}';

// Strings contribute their raw text; `null`, `"null"`, `7` and `"7"` all key
// differently since the store queries them differently.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) if s.starts_with(TAG) => format!("{TAG}{s}"),
        Value::String(s) => s.clone(),
        other => format!("{TAG}{other}"),
    }
}

fn digest(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
