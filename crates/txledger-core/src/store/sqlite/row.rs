//! Record row type for database queries.

use std::collections::BTreeMap;

use crate::error::{LedgerError, Result};
use crate::store::types::Record;
use crate::value::Value;

/// Raw row data from the records table, before parsing into domain types.
#[derive(Debug)]
pub struct RecordRow {
    pub generation: i64,
    pub bins_json: String,
}

impl TryFrom<RecordRow> for Record {
    type Error = LedgerError;

    fn try_from(row: RecordRow) -> Result<Self> {
        let generation = u32::try_from(row.generation)
            .map_err(|e| LedgerError::Storage(format!("Invalid generation: {}", e)))?;
        let bins: BTreeMap<String, Value> = serde_json::from_str(&row.bins_json)
            .map_err(|e| LedgerError::Storage(format!("Invalid bins JSON: {}", e)))?;

        Ok(Record { bins, generation })
    }
}
