//! Core data types for the store protocol.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::{ContextPath, Selection};
use crate::value::{MapKey, Value};

/// Address of one record: `(namespace, collection, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub namespace: String,
    pub collection: String,
    pub name: String,
}

impl Key {
    pub fn new(
        namespace: impl Into<String>,
        collection: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            collection: collection.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.collection, self.name)
    }
}

/// A stored record: named bins plus a write generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Named top-level values
    pub bins: BTreeMap<String, Value>,

    /// Incremented by every write that changes the record
    pub generation: u32,
}

impl Record {
    pub fn bin(&self, name: &str) -> Option<&Value> {
        self.bins.get(name)
    }
}

/// Primitive container operation applied inside `Store::atomic_write`.
///
/// Every op yields one result value; the ops of one call are applied in
/// order and either all take effect or none do.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Set `bin` to `value` if absent; otherwise require it to equal `value`.
    /// Result: the bin value.
    InitOrMatch { bin: String, value: Value },

    /// `bin = max(bin, value)`, treating an absent bin as `value`.
    /// Result: the new bin value.
    Max { bin: String, value: i64 },

    /// Insert items into the map in `bin`, creating the map if needed.
    /// With `create_only`, an existing key fails the whole write.
    /// Result: the new map size.
    MapPutItems {
        bin: String,
        items: Vec<(MapKey, Value)>,
        create_only: bool,
    },

    /// Result: the map size (0 for an absent bin).
    MapSize { bin: String },

    /// Remove every map entry. Result: `Nil`.
    MapClear { bin: String },

    /// Add `delta` to the integers addressed by `path` under map entry `key`,
    /// saturating at `clamp_max`.
    /// Result: list of the new values.
    MapModify {
        bin: String,
        key: MapKey,
        path: ContextPath,
        selection: Selection,
        delta: i64,
        clamp_max: i64,
    },

    /// Insert `value` at the key held by integer bin `counter`, then
    /// increment the counter. Result: the key used.
    MintAndPut {
        counter: String,
        bin: String,
        value: Value,
    },

    /// Remove map entries whose ordering key (see `codec::ordering_key`)
    /// lies in `[start, end)`. Entries without a key are kept.
    /// Result: the number removed.
    MapRemoveByValueRange {
        bin: String,
        key_path: ContextPath,
        start: f64,
        end: f64,
    },
}

impl Op {
    /// Whether the op can change the record.
    pub fn is_write(&self) -> bool {
        !matches!(self, Op::MapSize { .. })
    }

    /// Whether the op may create a record that does not exist yet.
    pub fn creates_record(&self) -> bool {
        matches!(
            self,
            Op::InitOrMatch { .. } | Op::Max { .. } | Op::MapPutItems { .. }
        )
    }
}
