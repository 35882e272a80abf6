//! In-process store backend.
//!
//! Records live in a mutex-guarded hash map. Useful for tests and for
//! embedding the engine without a database file.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::{LedgerError, Result};
use crate::store::ops::apply_ops;
use crate::store::traits::Store;
use crate::store::types::{Key, Op, Record};
use crate::value::Value;

/// Mutex-guarded in-memory record store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Key, Record>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable backend: every call fails with
    /// `StoreUnavailable` until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of records currently stored.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock_records()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock_records(&self) -> Result<MutexGuard<'_, HashMap<Key, Record>>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::StoreUnavailable(
                "memory store is offline".to_string(),
            ));
        }
        self.records
            .lock()
            .map_err(|_| LedgerError::Storage("Memory store poisoned".to_string()))
    }
}

impl Store for MemoryStore {
    fn atomic_write(&self, key: &Key, ops: &[Op]) -> Result<Vec<Value>> {
        let mut records = self.lock_records()?;
        let applied = apply_ops(key, records.get(key).cloned(), ops)?;
        if applied.dirty {
            records.insert(key.clone(), applied.record);
        }
        Ok(applied.results)
    }

    fn read(&self, key: &Key) -> Result<Option<Record>> {
        Ok(self.lock_records()?.get(key).cloned())
    }

    fn remove(&self, key: &Key) -> Result<()> {
        self.lock_records()?
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| LedgerError::NotFound(format!("record {}", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::MapKey;

    fn key() -> Key {
        Key::new("test", "customers", "bob")
    }

    fn put(id: i64) -> Op {
        Op::MapPutItems {
            bin: "txns".to_string(),
            items: vec![(MapKey::Int(id), Value::Int(1))],
            create_only: true,
        }
    }

    #[test]
    fn test_failed_write_leaves_record_untouched() {
        let store = MemoryStore::new();
        store.atomic_write(&key(), &[put(1)]).unwrap();
        let before = store.read(&key()).unwrap();

        let err = store.atomic_write(&key(), &[put(2), put(1)]).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateId(1)));
        assert_eq!(store.read(&key()).unwrap(), before);
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.remove(&key()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_offline_store_is_unavailable() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(store.read(&key()).unwrap_err().is_transient());
        store.set_offline(false);
        assert!(store.read(&key()).unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }
}
