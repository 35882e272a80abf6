//! Transaction value codec.
//!
//! Transaction values are stored in one of three shapes. The shape is chosen
//! when an entity's first entries are written and stays fixed afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::path::ContextPath;
use crate::value::{MapKey, Value};

/// Amount written into marker entries. Marker entries never count towards
/// aggregates.
pub const MARKER_AMOUNT: i64 = -1;

pub const TS_KEY: &str = "ts";
pub const AMOUNT_KEY: &str = "amount";
pub const LABEL_KEY: &str = "label";

/// Encoding of transaction values within one ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// The amount alone, as an integer scalar.
    Flat,
    /// `[ts, amount]` or `[ts, amount, label]`.
    List,
    /// `{"ts": .., "amount": .., "label": ..}`.
    Map,
}

impl ValueShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueShape::Flat => "flat",
            ValueShape::List => "list",
            ValueShape::Map => "map",
        }
    }

    /// Shape of an encoded value. Scalars are flat.
    pub fn of(value: &Value) -> ValueShape {
        match value {
            Value::List(_) => ValueShape::List,
            Value::Map(_) => ValueShape::Map,
            _ => ValueShape::Flat,
        }
    }

    /// Path to the amount field.
    pub fn amount_path(self) -> ContextPath {
        match self {
            ValueShape::Flat => ContextPath::root(),
            ValueShape::List => ContextPath::root().index(1),
            ValueShape::Map => ContextPath::root().key(AMOUNT_KEY),
        }
    }

    /// Path to the field expiration orders entries by. Flat values order by
    /// their own scalar.
    pub fn ordering_key_path(self) -> ContextPath {
        match self {
            ValueShape::Flat => ContextPath::root(),
            ValueShape::List => ContextPath::root().index(0),
            ValueShape::Map => ContextPath::root().key(TS_KEY),
        }
    }

    /// Stored form of the shape tag.
    pub fn to_value(self) -> Value {
        Value::from(self.as_str())
    }

    /// Parse a stored shape tag.
    pub fn from_value(value: &Value) -> Result<Self> {
        value
            .as_str()
            .ok_or_else(|| LedgerError::Storage(format!("Invalid shape tag: {}", value)))?
            .parse()
            .map_err(|_| LedgerError::Storage(format!("Unknown shape tag: {}", value)))
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueShape {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(ValueShape::Flat),
            "list" => Ok(ValueShape::List),
            "map" => Ok(ValueShape::Map),
            other => Err(LedgerError::InvalidInput(format!(
                "Unknown value shape: {} (use flat, list or map)",
                other
            ))),
        }
    }
}

/// A decoded transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub amount: i64,
    pub label: Option<String>,
}

impl Transaction {
    pub fn new(timestamp: f64, amount: i64) -> Self {
        Self {
            timestamp,
            amount,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Boundary marker written by expiration.
    pub fn marker(now: f64) -> Self {
        Self::new(now, MARKER_AMOUNT)
    }

    pub fn is_marker(&self) -> bool {
        self.amount == MARKER_AMOUNT
    }

    /// Encode into the given shape. `Flat` keeps only the amount.
    pub fn encode(&self, shape: ValueShape) -> Value {
        match shape {
            ValueShape::Flat => Value::Int(self.amount),
            ValueShape::List => {
                let mut items = vec![Value::Float(self.timestamp), Value::Int(self.amount)];
                if let Some(label) = &self.label {
                    items.push(Value::from(label.as_str()));
                }
                Value::List(items)
            }
            ValueShape::Map => {
                let mut map = BTreeMap::new();
                map.insert(MapKey::from(TS_KEY), Value::Float(self.timestamp));
                map.insert(MapKey::from(AMOUNT_KEY), Value::Int(self.amount));
                if let Some(label) = &self.label {
                    map.insert(MapKey::from(LABEL_KEY), Value::from(label.as_str()));
                }
                Value::Map(map)
            }
        }
    }

    /// Decode a list- or map-shaped value. Flat values carry no timestamp
    /// and cannot be decoded.
    pub fn decode(value: &Value) -> Result<Self> {
        let shape = ValueShape::of(value);
        if shape == ValueShape::Flat {
            return Err(LedgerError::ShapeMismatch(format!(
                "flat value {} has no timestamp",
                value
            )));
        }

        let timestamp = first_number(value, &shape.ordering_key_path())
            .ok_or_else(|| LedgerError::ShapeMismatch(format!("no timestamp in {}", value)))?;
        let amount = amount_of(value)
            .ok_or_else(|| LedgerError::ShapeMismatch(format!("no amount in {}", value)))?;
        let label = match value {
            Value::List(items) => items.get(2).and_then(Value::as_str).map(String::from),
            Value::Map(map) => map
                .get(&MapKey::from(LABEL_KEY))
                .and_then(Value::as_str)
                .map(String::from),
            _ => None,
        };

        Ok(Self {
            timestamp,
            amount,
            label,
        })
    }
}

/// Amount of an encoded value at its shape's default position.
pub fn amount_of(value: &Value) -> Option<i64> {
    let path = ValueShape::of(value).amount_path();
    path.resolve_values(value)
        .ok()?
        .first()
        .and_then(|amount| amount.as_i64())
}

/// Whether an encoded value is an expiration marker.
pub fn is_marker(value: &Value) -> bool {
    amount_of(value) == Some(MARKER_AMOUNT)
}

/// Ordering key of an encoded value: the first numeric value addressed by
/// `path`. `None` when the path does not resolve or addresses no number.
pub fn ordering_key(value: &Value, path: &ContextPath) -> Option<f64> {
    first_number(value, path)
}

fn first_number(value: &Value, path: &ContextPath) -> Option<f64> {
    path.resolve_values(value)
        .ok()?
        .into_iter()
        .find_map(Value::as_f64)
}
