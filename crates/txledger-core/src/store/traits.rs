//! Store trait definition.
//!
//! The `Store` trait is the only way the engine touches persisted records.
//! Backends decide how records are kept; the engine only relies on the
//! guarantees documented here.

use super::types::{Key, Op, Record};
use crate::error::Result;
use crate::value::Value;

/// Record store used by the ledger engine.
///
/// All implementations must ensure:
/// - `atomic_write` applies all of its ops or none of them
/// - concurrent callers (threads or processes) never observe a partial write
/// - connection-level timeouts surface as `LedgerError::StoreUnavailable`
pub trait Store: Send + Sync {
    /// Apply `ops` to the record at `key` as one unit.
    ///
    /// # Returns
    ///
    /// One result value per op, in order.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing op; the record is left
    /// untouched. Returns `LedgerError::NotFound` when the record does not
    /// exist and the first op cannot create it.
    fn atomic_write(&self, key: &Key, ops: &[Op]) -> Result<Vec<Value>>;

    /// Read the record at `key`.
    ///
    /// Returns `Ok(None)` if the record does not exist.
    fn read(&self, key: &Key) -> Result<Option<Record>>;

    /// Remove the record at `key`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` if the record does not exist.
    fn remove(&self, key: &Key) -> Result<()>;
}

impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    fn atomic_write(&self, key: &Key, ops: &[Op]) -> Result<Vec<Value>> {
        (**self).atomic_write(key, ops)
    }

    fn read(&self, key: &Key) -> Result<Option<Record>> {
        (**self).read(key)
    }

    fn remove(&self, key: &Key) -> Result<()> {
        (**self).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_is_object_safe() {
        fn _accepts_dyn_store(_store: &dyn Store) {}
        fn _accepts_store<T: Store>(_store: T) {}
    }
}
