//! Output formatting helpers for the CLI.
//!
//! `info` renders either comfy-table summaries or JSON documents.

mod json;
mod text;

use txledger_core::{Aggregate, Value, ValueShape};

// Re-export public API
pub use json::infos_json;
pub use text::{entries_table, summary_table};

/// Snapshot of one customer's ledger, as shown by `info`.
#[derive(Debug, Clone)]
pub struct LedgerInfo {
    pub customer: String,
    pub shape: Option<ValueShape>,
    pub size: usize,
    pub next_id: i64,
    pub aggregate: Aggregate,
    pub entries: Vec<(i64, Value)>,
}
