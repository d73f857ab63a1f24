//! Core value types for the path store.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A node in a namespace's value tree.
///
/// Containers and composites are reference counted, so cloning a `Value` is
/// cheap and never deep-copies. Reference identity is what the store uses to
/// detect change: see [`Value::same`].
///
/// `PartialEq` is structural (deep) equality and is provided for callers and
/// tests. The store itself never compares values structurally.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Rc<str>),
    /// Ordered sequence. Navigable by decimal index segments.
    Array(Rc<Vec<Value>>),
    /// Mapping from string keys. Navigable by key segments.
    Object(Rc<BTreeMap<String, Value>>),
    /// Ordered key/value entries with arbitrary keys.
    Map(Rc<Vec<(Value, Value)>>),
    /// Ordered unique members.
    Set(Rc<Vec<Value>>),
    Date(Rc<SystemTime>),
    Pattern(Rc<Pattern>),
}

/// A regular-expression-like pattern: source text plus flags.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    pub source: String,
    pub flags: String,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

impl Value {
    /// An empty object.
    pub fn empty_object() -> Self {
        Value::Object(Rc::new(BTreeMap::new()))
    }

    /// Build an object from key/value pairs.
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(Rc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Build an array from items.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(Rc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build a map. Later entries overwrite earlier entries with the same key.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut out: Vec<(Value, Value)> = Vec::new();
        for (k, v) in entries {
            let (k, v) = (k.into(), v.into());
            match out.iter_mut().find(|(existing, _)| existing.same(&k)) {
                Some(slot) => slot.1 = v,
                None => out.push((k, v)),
            }
        }
        Value::Map(Rc::new(out))
    }

    /// Build a set. Members that are the same as an earlier member are dropped.
    pub fn set<I, V>(members: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut out: Vec<Value> = Vec::new();
        for m in members {
            let m = m.into();
            if !out.iter().any(|existing| existing.same(&m)) {
                out.push(m);
            }
        }
        Value::Set(Rc::new(out))
    }

    pub fn date(at: SystemTime) -> Self {
        Value::Date(Rc::new(at))
    }

    pub fn pattern(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Value::Pattern(Rc::new(Pattern {
            source: source.into(),
            flags: flags.into(),
        }))
    }

    /// Identity comparison.
    ///
    /// Scalars are the same when their values are the same (floats compare
    /// bitwise, so `NaN` is the same as `NaN` and `0.0` differs from `-0.0`).
    /// Containers and composites are the same only when they share an
    /// allocation.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => Rc::ptr_eq(a, b),
            (Value::Date(a), Value::Date(b)) => Rc::ptr_eq(a, b),
            (Value::Pattern(a), Value::Pattern(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Short name of the runtime kind, used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Date(_) => "date",
            Value::Pattern(_) => "pattern",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for values a path can descend into (objects and arrays).
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(&**map),
            _ => None,
        }
    }

    /// Look up a direct child by segment. Arrays accept canonical decimal
    /// indices.
    pub fn child(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Convert to a `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        // Serializing a `Value` into `serde_json::Value` cannot fail: every
        // variant maps onto a JSON type and object keys are strings.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Parse an array index segment.
///
/// Only canonical decimal forms are accepted: ASCII digits with no sign and
/// no leading zero (other than `0` itself), so each slot has one path.
pub(crate) fn parse_index(segment: &str) -> Option<usize> {
    let canonical = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'));
    if canonical {
        segment.parse().ok()
    } else {
        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

// --- Conversions ---

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Object(Rc::new(map))
    }
}

impl From<SystemTime> for Value {
    fn from(at: SystemTime) -> Self {
        Value::date(at)
    }
}

impl From<Pattern> for Value {
    fn from(p: Pattern) -> Self {
        Value::Pattern(Rc::new(p))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::Array(Rc::new(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(obj) => Value::Object(Rc::new(
                obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
        }
    }
}

// --- Serialization ---

/// Milliseconds relative to the Unix epoch (negative before it).
fn epoch_millis(at: &SystemTime) -> i64 {
    match at.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    }
}

/// Inverse of the serialized date form.
pub fn date_from_millis(millis: i64) -> SystemTime {
    if millis >= 0 {
        UNIX_EPOCH + Duration::from_millis(millis as u64)
    } else {
        UNIX_EPOCH - Duration::from_millis(millis.unsigned_abs())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) | Value::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            // Map keys are arbitrary values, so entries go out as pairs.
            Value::Map(entries) => {
                let mut seq = serializer.serialize_seq(Some(entries.len()))?;
                for (k, v) in entries.iter() {
                    seq.serialize_element(&(k, v))?;
                }
                seq.end()
            }
            Value::Date(at) => serializer.serialize_i64(epoch_millis(at)),
            Value::Pattern(p) => serializer.collect_str(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_same_scalars_by_value() {
        assert!(Value::from(1).same(&Value::from(1)));
        assert!(Value::from("x").same(&Value::from("x")));
        assert!(Value::Float(f64::NAN).same(&Value::Float(f64::NAN)));
        assert!(!Value::Float(0.0).same(&Value::Float(-0.0)));
        assert!(!Value::from(1).same(&Value::from(1.0)));
    }

    #[test]
    fn test_same_containers_by_identity() {
        let a = Value::object([("k", 1)]);
        let b = Value::object([("k", 1)]);
        assert_eq!(a, b);
        assert!(!a.same(&b));
        assert!(a.same(&a.clone()));
    }

    #[test]
    fn test_from_json() {
        let v = Value::from(json!({"a": [1, 2.5, "s", null, true]}));
        let arr = v.child("a").unwrap().as_array().unwrap();
        assert_eq!(arr[0], Value::Int(1));
        assert_eq!(arr[1], Value::Float(2.5));
        assert_eq!(arr[2].as_str(), Some("s"));
        assert!(arr[3].is_null());
        assert_eq!(arr[4].as_bool(), Some(true));
    }

    #[test]
    fn test_to_json_composites() {
        let v = Value::object([
            ("set", Value::set([1, 1, 2])),
            ("map", Value::map([("k", 1), ("k", 2)])),
            ("re", Value::pattern("a+b", "gi")),
            ("at", Value::date(date_from_millis(1_500))),
        ]);
        assert_eq!(
            v.to_json(),
            json!({"set": [1, 2], "map": [["k", 2]], "re": "/a+b/gi", "at": 1500})
        );
    }

    #[test]
    fn test_child_lookup() {
        let v = Value::from(json!({"items": ["a", "b"]}));
        let items = v.child("items").unwrap();
        assert_eq!(items.child("1").unwrap().as_str(), Some("b"));
        assert!(items.child("2").is_none());
        assert!(items.child("x").is_none());
        assert!(Value::from(3).child("a").is_none());
    }

    #[test]
    fn test_index_segments_must_be_canonical() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("12"), Some(12));
        assert_eq!(parse_index("01"), None);
        assert_eq!(parse_index("00"), None);
        assert_eq!(parse_index("+1"), None);
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index(""), None);

        let items = Value::from(json!(["a", "b"]));
        assert!(items.child("01").is_none());
        assert!(items.child("+1").is_none());
    }

    #[test]
    fn test_date_millis_before_epoch() {
        let at = date_from_millis(-2_000);
        assert_eq!(epoch_millis(&at), -2_000);
    }
}
