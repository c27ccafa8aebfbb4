//! Raw document values.
//!
//! A [`Value`] is the untyped, ordered tree that decoders produce and that
//! presentations wrap. Maps keep declaration order so that everything
//! downstream (template order, plan key order) is deterministic.

use crate::path::{PathSegment, TreePath};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;

/// Ordered mapping of raw values
pub type Map = IndexMap<String, Value>;

/// An untyped document value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicit null or absent scalar
    #[default]
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Integer scalar
    Integer(i64),
    /// Floating point scalar
    Float(f64),
    /// String scalar
    String(String),
    /// Ordered sequence
    List(Vec<Value>),
    /// Ordered mapping
    Map(Map),
}

impl Value {
    /// Create an empty map value
    #[must_use]
    pub fn map() -> Self {
        Self::Map(Map::new())
    }

    /// Human readable name of this value's kind
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Check if the value is null
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if the value is a map
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Check if the value is a scalar (not a list or map)
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        !matches!(self, Self::List(_) | Self::Map(_))
    }

    /// Get as string slice
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as boolean
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float, widening integers
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as list
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get as map
    #[must_use]
    pub const fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Get as mutable map
    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this value is a map
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Walk a tree path from this value
    #[must_use]
    pub fn get_path(&self, path: &TreePath) -> Option<&Value> {
        path.segments().iter().try_fold(self, |current, segment| match segment {
            PathSegment::Key(key) => current.get(key),
            PathSegment::Index(index) => current.as_list().and_then(|items| items.get(*index)),
        })
    }

    /// Render a scalar as plain text (strings unquoted)
    #[must_use]
    pub fn to_plain_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Convert into a `serde_json` value
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::Map(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// Two keys of one YAML mapping name the same string key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mapping key \"{key}\" appears twice once keys are read as strings")]
pub struct DuplicateKey {
    /// Colliding key text
    pub key: String,
}

impl Value {
    /// Convert a YAML tree, rejecting mappings whose keys collide once
    /// stringified (e.g. `1` and `"1"`)
    ///
    /// # Errors
    ///
    /// Returns the first colliding key
    pub fn try_from_yaml(value: serde_yaml::Value) -> Result<Self, DuplicateKey> {
        from_yaml(value, &mut |key| Err(DuplicateKey { key }))
    }
}

/// Lenient conversion: a colliding key keeps its first position and takes
/// the later value, with a warning
impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        let converted = from_yaml(value, &mut |key: String| -> Result<(), Infallible> {
            tracing::warn!(%key, "mapping key appears twice once keys are read as strings");
            Ok(())
        });
        match converted {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }
}

fn from_yaml<E>(
    value: serde_yaml::Value,
    on_duplicate: &mut impl FnMut(String) -> Result<(), E>,
) -> Result<Value, E> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::List(
            items
                .into_iter()
                .map(|item| from_yaml(item, &mut *on_duplicate))
                .collect::<Result<_, _>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, item) in mapping {
                let key = yaml_key(key);
                let item = from_yaml(item, &mut *on_duplicate)?;
                if map.contains_key(&key) {
                    on_duplicate(key.clone())?;
                }
                map.insert(key, item);
            }
            Value::Map(map)
        }
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value, on_duplicate)?,
    })
}

/// YAML allows non-string keys; the raw tree is string-keyed.
fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => Value::from(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml_preserves_order() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("b: 1\na: two\nc: [true, 1.5]\n").unwrap();
        let value = Value::from(yaml);
        let keys: Vec<_> = value.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(value.get("b"), Some(&Value::Integer(1)));
        assert_eq!(value.get("a").and_then(Value::as_str), Some("two"));
        assert_eq!(
            value.get("c"),
            Some(&Value::List(vec![Value::Bool(true), Value::Float(1.5)]))
        );
    }

    #[test]
    fn test_yaml_non_string_keys() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("1: one\ntrue: yes\n").unwrap();
        let value = Value::from(yaml);
        assert!(value.get("1").is_some());
        assert!(value.get("true").is_some());
    }

    #[test]
    fn test_stringified_key_collision() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("1: number\n'1': text\nother: {true: a, 'true': b}\n").unwrap();
        let err = Value::try_from_yaml(yaml.clone()).unwrap_err();
        assert_eq!(err.key, "1");

        let lenient = Value::from(yaml);
        let keys: Vec<_> = lenient.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["1", "other"]);
        assert_eq!(lenient.get("1").and_then(Value::as_str), Some("text"));
    }

    #[test]
    fn test_get_path() {
        let value = Value::from(serde_json::json!({"a": {"b": [10, 20]}}));
        let path = TreePath::root().child("a").child("b").index(1);
        assert_eq!(value.get_path(&path), Some(&Value::Integer(20)));
        assert_eq!(value.get_path(&TreePath::root().child("missing")), None);
    }

    #[test]
    fn test_json_round_trip_keeps_order() {
        let value = Value::from(serde_json::json!({"z": 1, "a": null}));
        assert_eq!(value.to_string(), r#"{"z":1,"a":null}"#);
        assert_eq!(Value::from(value.to_json()), value);
    }

    #[test]
    fn test_to_plain_string() {
        assert_eq!(Value::from("abc").to_plain_string(), "abc");
        assert_eq!(Value::Integer(3).to_plain_string(), "3");
        assert_eq!(Value::Null.to_plain_string(), "");
    }

    #[test]
    fn test_kind_name() {
        assert_eq!(Value::map().kind_name(), "map");
        assert_eq!(Value::List(vec![]).kind_name(), "list");
        assert!(Value::Bool(false).is_scalar());
    }
}
