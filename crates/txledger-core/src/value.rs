//! Dynamic value tree stored in record bins.
//!
//! A `Value` is what the store natively holds: scalars plus two container
//! kinds (ordered list and key-ordered map). Transaction values, the
//! retention marker and the shape tag are all encoded as `Value`s.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Key of a map container.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MapKey {
    Int(i64),
    Str(String),
}

impl From<i64> for MapKey {
    fn from(value: i64) -> Self {
        MapKey::Int(value)
    }
}

impl From<&str> for MapKey {
    fn from(value: &str) -> Self {
        MapKey::Str(value.to_string())
    }
}

impl From<String> for MapKey {
    fn from(value: String) -> Self {
        MapKey::Str(value)
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Int(value) => write!(f, "{}", value),
            MapKey::Str(value) => write!(f, "{}", value),
        }
    }
}

/// A stored value: scalar, list, or map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(#[serde(with = "map_pairs")] BTreeMap<MapKey, Value>),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric view of `Int` and `Float` values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<MapKey, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Whether every float in the tree is finite. JSON has no encoding for
    /// NaN or infinities.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Float(value) => value.is_finite(),
            Value::List(items) => items.iter().all(Value::is_finite),
            Value::Map(map) => map.values().all(Value::is_finite),
            _ => true,
        }
    }

    /// Convert to a JSON value for output. Map keys become strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Nil => serde_json::Value::Null,
            Value::Bool(value) => serde_json::Value::Bool(*value),
            Value::Int(value) => serde_json::Value::from(*value),
            Value::Float(value) => serde_json::Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(value) => serde_json::Value::String(value.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, value)| (key.to_string(), value.to_json()))
                    .collect(),
            ),
        }
    }

    /// Build a value from JSON input. Object keys become string map keys.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(value) => Value::Bool(*value),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(value) => Value::Int(value),
                None => Value::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(value) => Value::Str(value.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(object) => Value::Map(
                object
                    .iter()
                    .map(|(key, value)| (MapKey::Str(key.clone()), Value::from_json(value)))
                    .collect(),
            ),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Maps serialize as ordered `(key, value)` pairs so integer keys survive
/// formats whose object keys are strings.
mod map_pairs {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::{MapKey, Value};

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<MapKey, Value>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<MapKey, Value>, D::Error> {
        let pairs: Vec<(MapKey, Value)> = Vec::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_map_keys_survive_json() {
        let mut map = BTreeMap::new();
        map.insert(MapKey::Int(100), Value::Int(10));
        map.insert(MapKey::Str("label".into()), Value::from("rent"));
        let value = Value::Map(map);

        let encoded = serde_json::to_string(&value).unwrap();
        let decoded: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_is_finite_walks_nested_containers() {
        let mut map = BTreeMap::new();
        map.insert(MapKey::from("ts"), Value::Float(1.5));
        map.insert(MapKey::from("splits"), Value::List(vec![Value::Int(1)]));
        assert!(Value::Map(map.clone()).is_finite());

        map.insert(
            MapKey::from("splits"),
            Value::List(vec![Value::Float(f64::INFINITY)]),
        );
        assert!(!Value::Map(map).is_finite());
        assert!(!Value::Float(f64::NAN).is_finite());
    }

    #[test]
    fn test_json_output_uses_string_keys() {
        let mut map = BTreeMap::new();
        map.insert(MapKey::Int(7), Value::List(vec![Value::Float(1.5), Value::Int(3)]));
        let json = Value::Map(map).to_json();
        assert_eq!(json, serde_json::json!({"7": [1.5, 3]}));
    }

    #[test]
    fn test_from_json_prefers_integers() {
        let value = Value::from_json(&serde_json::json!([2, 2.5, "x", null]));
        assert_eq!(
            value,
            Value::List(vec![
                Value::Int(2),
                Value::Float(2.5),
                Value::from("x"),
                Value::Nil
            ])
        );
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::Int(4).as_f64(), Some(4.0));
        assert_eq!(Value::Float(4.5).as_i64(), None);
        assert_eq!(Value::from("a").as_f64(), None);
    }
}
