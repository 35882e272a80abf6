//! Ledger store: one transaction map per entity.
//!
//! `LedgerStore` is the engine's entry point. It owns a `Store` handle and a
//! `LedgerConfig`; the mutation, expiration and aggregation engines are
//! further `impl` blocks on the same type.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::codec::ValueShape;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::store::{Op, Record, Store};
use crate::value::{MapKey, Value};

/// Caller-supplied watermark for `append_batch`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionMetadata {
    /// Lowest value the retention marker may hold after the batch.
    pub next_id_floor: Option<i64>,
}

impl RetentionMetadata {
    pub fn with_floor(next_id_floor: i64) -> Self {
        Self {
            next_id_floor: Some(next_id_floor),
        }
    }
}

/// Per-entity transaction ledgers over a `Store`.
pub struct LedgerStore<S: Store> {
    store: S,
    config: LedgerConfig,
}

impl<S: Store> LedgerStore<S> {
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Insert `entries` into the entity's ledger as one unit, creating the
    /// entity if needed.
    ///
    /// # Returns
    ///
    /// The ledger size after the batch.
    ///
    /// # Errors
    ///
    /// - `LedgerError::DuplicateId` if an id exists or repeats in the batch
    /// - `LedgerError::ShapeMismatch` if entries mix shapes or differ from the
    ///   entity's shape
    /// - `LedgerError::InvalidInput` if a value holds a NaN or infinite float
    pub fn append_batch(
        &self,
        entity: &str,
        entries: &[(i64, Value)],
        retention: RetentionMetadata,
    ) -> Result<usize> {
        let key = self.config.key(entity);
        let floor = retention.next_id_floor.unwrap_or(0);

        let Some((_, first)) = entries.first() else {
            let results = self.store.atomic_write(
                &key,
                &[
                    Op::Max {
                        bin: self.config.marker_bin.clone(),
                        value: floor,
                    },
                    Op::MapSize {
                        bin: self.config.ledger_bin.clone(),
                    },
                ],
            )?;
            return size_result(&results[1]);
        };

        if let Some((id, _)) = entries.iter().find(|(_, value)| !value.is_finite()) {
            return Err(LedgerError::InvalidInput(format!(
                "transaction {} holds a non-finite number",
                id
            )));
        }

        let shape = ValueShape::of(first);
        if let Some((id, value)) = entries
            .iter()
            .find(|(_, value)| ValueShape::of(value) != shape)
        {
            return Err(LedgerError::ShapeMismatch(format!(
                "batch mixes shapes: transaction {} is {}, batch is {}",
                id,
                ValueShape::of(value),
                shape
            )));
        }

        let max_id = entries.iter().map(|(id, _)| *id).max().unwrap_or(0);
        let next_id = max_id
            .checked_add(1)
            .ok_or_else(|| LedgerError::InvalidInput(format!("transaction id {} too large", max_id)))?;

        let items = entries
            .iter()
            .map(|(id, value)| (MapKey::Int(*id), value.clone()))
            .collect();

        let results = self.store.atomic_write(
            &key,
            &[
                Op::InitOrMatch {
                    bin: self.config.shape_bin.clone(),
                    value: shape.to_value(),
                },
                Op::MapPutItems {
                    bin: self.config.ledger_bin.clone(),
                    items,
                    create_only: true,
                },
                Op::Max {
                    bin: self.config.marker_bin.clone(),
                    value: next_id.max(floor),
                },
            ],
        )?;

        let size = size_result(&results[1])?;
        info!(entity, count = entries.len(), size, %shape, "appended batch");
        Ok(size)
    }

    /// Look up one transaction.
    pub fn get(&self, entity: &str, id: i64) -> Result<Value> {
        let record = self.read_record(entity)?;
        ledger_map(&record, &self.config.ledger_bin)?
            .and_then(|map| map.get(&MapKey::Int(id)))
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {} of {}", id, entity)))
    }

    /// Number of transactions in the entity's ledger.
    pub fn size(&self, entity: &str) -> Result<usize> {
        let record = self.read_record(entity)?;
        Ok(ledger_map(&record, &self.config.ledger_bin)?.map_or(0, BTreeMap::len))
    }

    /// Transactions in the half-open index window `[start, end)`.
    ///
    /// Index order is ascending id order. Newer transactions get smaller
    /// ids, so this is newest-first: index 0 is the most recent transaction
    /// and recency descends with the index. Bounds are clamped to the ledger
    /// size.
    pub fn range_scan(&self, entity: &str, start: usize, end: usize) -> Result<Vec<(i64, Value)>> {
        let record = self.read_record(entity)?;
        let Some(map) = ledger_map(&record, &self.config.ledger_bin)? else {
            return Ok(Vec::new());
        };

        let end = end.min(map.len());
        let start = start.min(end);
        let mut entries = Vec::with_capacity(end - start);
        for (key, value) in map.iter().skip(start).take(end - start) {
            match key {
                MapKey::Int(id) => entries.push((*id, value.clone())),
                MapKey::Str(name) => {
                    return Err(LedgerError::Storage(format!(
                        "ledger of {} holds non-integer id {}",
                        entity, name
                    )))
                }
            }
        }
        Ok(entries)
    }

    /// Remove every transaction but keep the entity, its retention marker and
    /// its shape. A missing entity is not an error.
    pub fn clear(&self, entity: &str) -> Result<()> {
        let key = self.config.key(entity);
        let result = self.store.atomic_write(
            &key,
            &[Op::MapClear {
                bin: self.config.ledger_bin.clone(),
            }],
        );
        match result {
            Ok(_) => {
                info!(entity, "cleared ledger");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                warn!(entity, "clear: entity already absent");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Remove the entity entirely. A missing entity is not an error.
    pub fn drop_entity(&self, entity: &str) -> Result<()> {
        let key = self.config.key(entity);
        match self.store.remove(&key) {
            Ok(()) => {
                info!(entity, "dropped entity");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                warn!(entity, "drop: entity already absent");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Current retention marker: the next id expiration will mint.
    pub fn next_id(&self, entity: &str) -> Result<i64> {
        let record = self.read_record(entity)?;
        match record.bin(&self.config.marker_bin) {
            None => Ok(0),
            Some(Value::Int(next)) => Ok(*next),
            Some(other) => Err(LedgerError::Storage(format!(
                "retention marker of {} holds {}",
                entity,
                other.kind()
            ))),
        }
    }

    /// The entity's value shape, `None` until its first non-empty write.
    pub fn shape(&self, entity: &str) -> Result<Option<ValueShape>> {
        let record = self.read_record(entity)?;
        self.record_shape(&record)
    }

    pub(crate) fn record_shape(&self, record: &Record) -> Result<Option<ValueShape>> {
        record
            .bin(&self.config.shape_bin)
            .map(ValueShape::from_value)
            .transpose()
    }

    pub(crate) fn read_record(&self, entity: &str) -> Result<Record> {
        self.store
            .read(&self.config.key(entity))?
            .ok_or_else(|| LedgerError::NotFound(format!("entity {}", entity)))
    }
}

fn ledger_map<'a>(record: &'a Record, bin: &str) -> Result<Option<&'a BTreeMap<MapKey, Value>>> {
    match record.bin(bin) {
        None => Ok(None),
        Some(Value::Map(map)) => Ok(Some(map)),
        Some(other) => Err(LedgerError::Storage(format!(
            "ledger bin {} holds {}",
            bin,
            other.kind()
        ))),
    }
}

fn size_result(value: &Value) -> Result<usize> {
    value
        .as_i64()
        .and_then(|size| usize::try_from(size).ok())
        .ok_or_else(|| LedgerError::Storage(format!("unexpected size result {}", value)))
}
