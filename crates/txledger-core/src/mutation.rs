//! Context-addressed numeric updates.

use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::ledger::LedgerStore;
use crate::path::{ContextPath, Selection};
use crate::store::{Op, Store};
use crate::value::{MapKey, Value};

impl<S: Store> LedgerStore<S> {
    /// Add `delta` to the integers that `path` addresses inside transaction
    /// `id`, saturating at `clamp_max`. There is no lower bound; note that an
    /// amount driven to `MARKER_AMOUNT` (-1) makes the transaction read as an
    /// expiration marker, and `aggregate` then leaves it out.
    ///
    /// The read-modify-write happens inside one store write, so concurrent
    /// mutations of the same transaction never lose updates.
    ///
    /// # Returns
    ///
    /// The new value of every mutated target, in container order.
    ///
    /// # Errors
    ///
    /// - `LedgerError::NotFound` if the entity or the transaction is absent
    /// - `LedgerError::ShapeMismatch` if the path does not fit the entity's
    ///   shape or addresses a non-integer
    /// - `LedgerError::PathNotFound` / `LedgerError::AmbiguousPath` per
    ///   `selection`
    pub fn mutate_numeric(
        &self,
        entity: &str,
        id: i64,
        path: &ContextPath,
        selection: Selection,
        delta: i64,
        clamp_max: i64,
    ) -> Result<Vec<i64>> {
        let record = self.read_record(entity)?;
        let shape = self.record_shape(&record)?.ok_or_else(|| {
            LedgerError::NotFound(format!("transaction {} of {}", id, entity))
        })?;
        path.validate(shape)?;

        let results = self.store().atomic_write(
            &self.config().key(entity),
            &[Op::MapModify {
                bin: self.config().ledger_bin.clone(),
                key: MapKey::Int(id),
                path: path.clone(),
                selection,
                delta,
                clamp_max,
            }],
        )?;

        let updated: Vec<i64> = match results.first() {
            Some(Value::List(values)) => values.iter().filter_map(Value::as_i64).collect(),
            other => {
                return Err(LedgerError::Storage(format!(
                    "unexpected modify result {:?}",
                    other
                )))
            }
        };
        debug!(entity, id, %path, delta, clamp_max, ?updated, "mutated transaction");
        Ok(updated)
    }
}
