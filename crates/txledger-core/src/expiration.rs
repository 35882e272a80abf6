//! Retention-window expiration.

use std::time::Duration;

use tracing::info;

use crate::codec::Transaction;
use crate::error::{LedgerError, Result};
use crate::ledger::LedgerStore;
use crate::path::ContextPath;
use crate::store::{Op, Store};
use crate::value::Value;

/// Outcome of one `expire` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expired {
    /// Entries removed from the ledger
    pub removed: usize,
    /// Id minted for the marker entry
    pub marker_id: i64,
    /// `now - retention_window`
    pub cutoff: f64,
}

impl<S: Store> LedgerStore<S> {
    /// Write a marker entry at a freshly minted id, then remove every entry
    /// whose ordering key lies in `[0, now - retention_window)`.
    ///
    /// `key_path` locates the ordering key inside each value; `None` uses
    /// the shape's default (the timestamp, or the scalar itself for flat
    /// ledgers). Entries without an ordering key are kept. Minting, marker
    /// insertion and removal are one atomic store write.
    ///
    /// # Errors
    ///
    /// - `LedgerError::NotFound` if the entity is absent
    /// - `LedgerError::InvalidInput` if `now` is not finite
    /// - `LedgerError::ShapeMismatch` if `key_path` does not fit the shape
    pub fn expire(
        &self,
        entity: &str,
        retention_window: Duration,
        now: f64,
        key_path: Option<&ContextPath>,
    ) -> Result<Expired> {
        if !now.is_finite() {
            return Err(LedgerError::InvalidInput(format!(
                "expiration time must be finite, got {}",
                now
            )));
        }

        let record = self.read_record(entity)?;
        let shape = self
            .record_shape(&record)?
            .unwrap_or(self.config().default_shape);
        let key_path = match key_path {
            Some(path) => path.clone(),
            None => shape.ordering_key_path(),
        };
        key_path.validate(shape)?;

        let cutoff = now - retention_window.as_secs_f64();
        let config = self.config();
        let results = self.store().atomic_write(
            &config.key(entity),
            &[
                Op::InitOrMatch {
                    bin: config.shape_bin.clone(),
                    value: shape.to_value(),
                },
                Op::MintAndPut {
                    counter: config.marker_bin.clone(),
                    bin: config.ledger_bin.clone(),
                    value: Transaction::marker(now).encode(shape),
                },
                Op::MapRemoveByValueRange {
                    bin: config.ledger_bin.clone(),
                    key_path,
                    start: 0.0,
                    end: cutoff,
                },
            ],
        )?;

        let marker_id = results[1].as_i64().ok_or_else(|| unexpected(&results[1]))?;
        let removed = results[2]
            .as_i64()
            .and_then(|removed| usize::try_from(removed).ok())
            .ok_or_else(|| unexpected(&results[2]))?;

        info!(entity, removed, marker_id, cutoff, "expired ledger entries");
        Ok(Expired {
            removed,
            marker_id,
            cutoff,
        })
    }
}

fn unexpected(value: &Value) -> LedgerError {
    LedgerError::Storage(format!("unexpected expire result {}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{is_marker, ValueShape};
    use crate::config::LedgerConfig;
    use crate::ledger::RetentionMetadata;
    use crate::store::MemoryStore;

    fn ledger_with(shape: ValueShape, timestamps: &[(i64, f64)]) -> LedgerStore<MemoryStore> {
        let ledger = LedgerStore::new(MemoryStore::new(), LedgerConfig::default());
        let entries: Vec<(i64, Value)> = timestamps
            .iter()
            .map(|(id, ts)| (*id, Transaction::new(*ts, 10).encode(shape)))
            .collect();
        ledger
            .append_batch("alice", &entries, RetentionMetadata::default())
            .unwrap();
        ledger
    }

    #[test]
    fn test_removes_entries_below_cutoff() {
        for shape in [ValueShape::List, ValueShape::Map] {
            let ledger = ledger_with(shape, &[(100, 5.0), (99, 50.0), (98, 950.0)]);
            let expired = ledger
                .expire("alice", Duration::from_secs(100), 1000.0, None)
                .unwrap();

            assert_eq!(expired.removed, 2);
            assert_eq!(expired.cutoff, 900.0);
            assert_eq!(expired.marker_id, 101);
            assert!(ledger.get("alice", 98).is_ok());
            assert!(ledger.get("alice", 99).unwrap_err().is_not_found());
            let marker = ledger.get("alice", 101).unwrap();
            assert!(is_marker(&marker));
            assert_eq!(ledger.size("alice").unwrap(), 2);
            assert_eq!(ledger.next_id("alice").unwrap(), 102);
        }
    }

    #[test]
    fn test_entry_at_cutoff_is_kept() {
        let ledger = ledger_with(ValueShape::List, &[(10, 900.0), (9, 899.999)]);
        let expired = ledger
            .expire("alice", Duration::from_secs(100), 1000.0, None)
            .unwrap();
        assert_eq!(expired.removed, 1);
        assert!(ledger.get("alice", 10).is_ok());
    }

    #[test]
    fn test_size_changes_by_one_minus_removed() {
        let ledger = ledger_with(ValueShape::Map, &[(3, 1.0), (2, 2000.0), (1, 3.0)]);
        let before = ledger.size("alice").unwrap();
        let expired = ledger
            .expire("alice", Duration::from_secs(10), 1000.0, None)
            .unwrap();
        assert_eq!(ledger.size("alice").unwrap(), before + 1 - expired.removed);
    }

    #[test]
    fn test_empty_ledger_still_gets_marker() {
        let ledger = ledger_with(ValueShape::List, &[(1, 10.0)]);
        ledger.clear("alice").unwrap();

        let expired = ledger
            .expire("alice", Duration::from_secs(60), 1000.0, None)
            .unwrap();
        assert_eq!(expired.removed, 0);
        assert_eq!(expired.marker_id, 2);
        assert_eq!(ledger.size("alice").unwrap(), 1);

        let second = ledger
            .expire("alice", Duration::from_secs(60), 1000.0, None)
            .unwrap();
        assert_eq!(second.marker_id, 3);
    }

    #[test]
    fn test_unshaped_entity_uses_default_shape() {
        let ledger = LedgerStore::new(MemoryStore::new(), LedgerConfig::default());
        ledger
            .append_batch("alice", &[], RetentionMetadata::with_floor(50))
            .unwrap();
        let expired = ledger
            .expire("alice", Duration::from_secs(1), 10.0, None)
            .unwrap();
        assert_eq!(expired.marker_id, 50);
        assert_eq!(ledger.shape("alice").unwrap(), Some(ValueShape::List));
    }

    #[test]
    fn test_flat_marker_is_never_expired() {
        let ledger = ledger_with(ValueShape::Flat, &[(5, 0.0)]);
        let first = ledger
            .expire("alice", Duration::from_secs(0), 1000.0, None)
            .unwrap();
        // the flat scalar 10 is its own ordering key
        assert_eq!(first.removed, 1);
        let second = ledger
            .expire("alice", Duration::from_secs(0), 1000.0, None)
            .unwrap();
        assert_eq!(second.removed, 0);
        assert_eq!(ledger.size("alice").unwrap(), 2);
    }

    #[test]
    fn test_custom_key_path() {
        let ledger = ledger_with(ValueShape::List, &[(2, 5.0), (1, 6.0)]);
        // order by amount (10) instead of timestamp
        let expired = ledger
            .expire(
                "alice",
                Duration::from_secs(990),
                1000.0,
                Some(&ContextPath::root().index(1)),
            )
            .unwrap();
        assert_eq!(expired.removed, 0);

        let err = ledger
            .expire(
                "alice",
                Duration::from_secs(1),
                1000.0,
                Some(&ContextPath::root().key("ts")),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::ShapeMismatch(_)));
    }

    #[test]
    fn test_missing_entity_and_bad_time() {
        let ledger = ledger_with(ValueShape::List, &[(1, 1.0)]);
        assert!(ledger
            .expire("bob", Duration::from_secs(1), 10.0, None)
            .unwrap_err()
            .is_not_found());
        assert!(matches!(
            ledger.expire("alice", Duration::from_secs(1), f64::NAN, None),
            Err(LedgerError::InvalidInput(_))
        ));
    }
}
