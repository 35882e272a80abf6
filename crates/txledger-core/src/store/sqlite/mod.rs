//! SQLite store backend.
//!
//! Each record is one row keyed by `(namespace, collection, name)`, with its
//! bins serialized as JSON. `atomic_write` runs inside an `IMMEDIATE`
//! transaction, which serializes writers across processes sharing the
//! database file. The connection busy timeout bounds how long a writer
//! waits for that lock.

mod row;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::store::ops::apply_ops;
use crate::store::traits::Store;
use crate::store::types::{Key, Op, Record};
use crate::value::Value;

use row::RecordRow;

/// Default wait for a locked database before reporting `StoreUnavailable`.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// SQLite-backed record store.
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::StoreUnavailable` if the file cannot be opened.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            LedgerError::StoreUnavailable(format!("Cannot open {}: {}", path.display(), e))
        })?;
        conn.busy_timeout(busy_timeout)?;
        Self::init_schema(&conn)?;
        debug!(path = %path.display(), "opened sqlite store");

        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    /// Database file path, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                namespace TEXT NOT NULL,
                collection TEXT NOT NULL,
                name TEXT NOT NULL,
                generation INTEGER NOT NULL,
                bins_json TEXT NOT NULL,
                PRIMARY KEY (namespace, collection, name)
            );
            "#,
        )?;
        Ok(())
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Storage("SQLite connection poisoned".to_string()))
    }

    fn load(conn: &Connection, key: &Key) -> Result<Option<Record>> {
        let row = conn
            .query_row(
                r#"
                SELECT generation, bins_json
                FROM records
                WHERE namespace = ? AND collection = ? AND name = ?
                "#,
                (&key.namespace, &key.collection, &key.name),
                |row| {
                    Ok(RecordRow {
                        generation: row.get(0)?,
                        bins_json: row.get(1)?,
                    })
                },
            )
            .optional()?;

        row.map(Record::try_from).transpose()
    }
}

impl Store for SqliteStore {
    fn atomic_write(&self, key: &Key, ops: &[Op]) -> Result<Vec<Value>> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = Self::load(&tx, key)?;
        let applied = apply_ops(key, current, ops)?;

        if applied.dirty {
            let bins_json = serde_json::to_string(&applied.record.bins)?;
            tx.execute(
                r#"
                INSERT INTO records (namespace, collection, name, generation, bins_json)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT (namespace, collection, name)
                DO UPDATE SET generation = excluded.generation, bins_json = excluded.bins_json
                "#,
                (
                    &key.namespace,
                    &key.collection,
                    &key.name,
                    i64::from(applied.record.generation),
                    bins_json,
                ),
            )?;
        }

        tx.commit()?;
        Ok(applied.results)
    }

    fn read(&self, key: &Key) -> Result<Option<Record>> {
        let conn = self.lock_conn()?;
        Self::load(&conn, key)
    }

    fn remove(&self, key: &Key) -> Result<()> {
        let conn = self.lock_conn()?;
        let removed = conn.execute(
            "DELETE FROM records WHERE namespace = ? AND collection = ? AND name = ?",
            (&key.namespace, &key.collection, &key.name),
        )?;
        if removed == 0 {
            return Err(LedgerError::NotFound(format!("record {}", key)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::MapKey;

    fn key() -> Key {
        Key::new("test", "customers", "carol")
    }

    #[test]
    fn test_write_then_read() {
        let store = SqliteStore::open_in_memory().unwrap();
        let results = store
            .atomic_write(
                &key(),
                &[
                    Op::MapPutItems {
                        bin: "txns".to_string(),
                        items: vec![(MapKey::Int(100), Value::Int(10))],
                        create_only: true,
                    },
                    Op::Max {
                        bin: "next_id".to_string(),
                        value: 101,
                    },
                ],
            )
            .unwrap();
        assert_eq!(results, vec![Value::Int(1), Value::Int(101)]);

        let record = store.read(&key()).unwrap().unwrap();
        assert_eq!(record.generation, 1);
        assert_eq!(record.bin("next_id"), Some(&Value::Int(101)));
        assert!(store.path().is_none());
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .atomic_write(
                &key(),
                &[Op::MapClear {
                    bin: "txns".to_string(),
                }],
            )
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.read(&key()).unwrap().is_none());
    }

    #[test]
    fn test_remove() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .atomic_write(
                &key(),
                &[Op::Max {
                    bin: "next_id".to_string(),
                    value: 0,
                }],
            )
            .unwrap();
        store.remove(&key()).unwrap();
        assert!(store.remove(&key()).unwrap_err().is_not_found());
    }
}
