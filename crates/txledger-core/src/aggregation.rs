//! Read-side statistics over a ledger.

use serde::Serialize;
use tracing::debug;

use crate::codec::is_marker;
use crate::error::Result;
use crate::ledger::LedgerStore;
use crate::path::ContextPath;
use crate::store::Store;

/// Count, sum and average of the addressed integers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregate {
    /// Integers aggregated
    pub count: usize,
    pub sum: i64,
    /// `sum / count`; `None` when there is no data
    pub average: Option<f64>,
    /// Marker entries left out
    pub markers: usize,
    /// Entries whose path did not resolve to any integer
    pub skipped: usize,
}

impl<S: Store> LedgerStore<S> {
    /// Scan the whole ledger and aggregate every integer `path` addresses.
    ///
    /// Marker entries and entries where the path fails or finds no integer
    /// are left out. An empty ledger yields `average: None`.
    ///
    /// A marker is recognized by its amount alone (`MARKER_AMOUNT`), so a
    /// regular transaction whose amount is -1 is counted under `markers`
    /// and excluded from the totals.
    pub fn aggregate(&self, entity: &str, path: &ContextPath) -> Result<Aggregate> {
        let entries = self.range_scan(entity, 0, usize::MAX)?;

        let mut count = 0usize;
        let mut sum = 0i64;
        let mut markers = 0usize;
        let mut skipped = 0usize;

        for (_, value) in &entries {
            if is_marker(value) {
                markers += 1;
                continue;
            }
            let amounts: Vec<i64> = match path.resolve_values(value) {
                Ok(found) => found.into_iter().filter_map(|v| v.as_i64()).collect(),
                Err(_) => Vec::new(),
            };
            if amounts.is_empty() {
                skipped += 1;
                continue;
            }
            count += amounts.len();
            sum = amounts.into_iter().fold(sum, i64::saturating_add);
        }

        let average = (count > 0).then(|| sum as f64 / count as f64);
        debug!(entity, %path, count, sum, markers, skipped, "aggregated ledger");

        Ok(Aggregate {
            count,
            sum,
            average,
            markers,
            skipped,
        })
    }
}
