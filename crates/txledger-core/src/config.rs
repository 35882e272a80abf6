//! Engine configuration.
//!
//! Everything the engine needs to locate records is passed in explicitly;
//! there is no process-wide state.

use serde::{Deserialize, Serialize};

use crate::codec::ValueShape;
use crate::store::Key;

/// Where ledgers live and how their records are laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Record namespace
    pub namespace: String,

    /// Collection holding one record per entity
    pub collection: String,

    /// Bin holding the transaction map
    pub ledger_bin: String,

    /// Bin holding the retention marker (`next id`)
    pub marker_bin: String,

    /// Bin holding the entity's value shape tag
    pub shape_bin: String,

    /// Shape used when expiration writes into a ledger that has no shape yet
    pub default_shape: ValueShape,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            namespace: "test".to_string(),
            collection: "customers".to_string(),
            ledger_bin: "txns".to_string(),
            marker_bin: "next_id".to_string(),
            shape_bin: "shape".to_string(),
            default_shape: ValueShape::List,
        }
    }
}

impl LedgerConfig {
    pub fn new(namespace: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Record key of an entity.
    pub fn key(&self, entity: &str) -> Key {
        Key::new(&self.namespace, &self.collection, entity)
    }
}
