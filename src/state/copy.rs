//! One-level copy of a value.

use crate::types::Value;
use std::rc::Rc;

/// Produce a new top-level container of the same kind.
///
/// Children are shared with the original, so nested identity is preserved
/// and only the returned container is new. Scalars are returned unchanged.
pub fn shallow_copy(value: &Value) -> Value {
    match value {
        Value::Null
        | Value::Bool(_)
        | Value::Int(_)
        | Value::Float(_)
        | Value::String(_) => value.clone(),
        Value::Array(items) => Value::Array(Rc::new(items.as_ref().clone())),
        Value::Object(map) => Value::Object(Rc::new(map.as_ref().clone())),
        Value::Map(entries) => Value::Map(Rc::new(entries.as_ref().clone())),
        Value::Set(members) => Value::Set(Rc::new(members.as_ref().clone())),
        Value::Date(at) => Value::Date(Rc::new(*at.as_ref())),
        Value::Pattern(p) => Value::Pattern(Rc::new(p.as_ref().clone())),
    }
}
