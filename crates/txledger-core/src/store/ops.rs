//! Record-level execution of primitive ops.
//!
//! Backends load the current record, run `apply_ops` against a copy, and
//! persist the copy only when every op succeeded. That is what makes
//! `Store::atomic_write` all-or-nothing.

use std::collections::BTreeMap;

use crate::codec::ordering_key;
use crate::error::{LedgerError, Result};
use crate::path;
use crate::store::types::{Key, Op, Record};
use crate::value::{MapKey, Value};

/// Result of running a batch of ops against a record.
#[derive(Debug)]
pub struct Applied {
    /// The record after all ops
    pub record: Record,
    /// One result per op
    pub results: Vec<Value>,
    /// Whether the record must be persisted
    pub dirty: bool,
}

/// Run `ops` against `current` (`None` when the record does not exist).
///
/// Ops that need an existing record fail with `NotFound` unless an earlier
/// op in the same batch created it.
pub fn apply_ops(key: &Key, current: Option<Record>, ops: &[Op]) -> Result<Applied> {
    let mut exists = current.is_some();
    let mut record = current.unwrap_or_default();
    let mut results = Vec::with_capacity(ops.len());
    let mut dirty = false;

    for op in ops {
        if !exists && !op.creates_record() {
            return Err(LedgerError::NotFound(format!("record {}", key)));
        }
        results.push(apply_op(&mut record, op)?);
        exists = true;
        dirty |= op.is_write();
    }

    if dirty {
        record.generation = record.generation.wrapping_add(1);
    }

    Ok(Applied {
        record,
        results,
        dirty,
    })
}

fn apply_op(record: &mut Record, op: &Op) -> Result<Value> {
    match op {
        Op::InitOrMatch { bin, value } => match record.bins.get(bin) {
            None => {
                record.bins.insert(bin.clone(), value.clone());
                Ok(value.clone())
            }
            Some(existing) if existing == value => Ok(existing.clone()),
            Some(existing) => Err(LedgerError::ShapeMismatch(format!(
                "bin {} holds {}, write expects {}",
                bin, existing, value
            ))),
        },

        Op::Max { bin, value } => {
            let current = match record.bins.get(bin) {
                None => *value,
                Some(Value::Int(current)) => (*current).max(*value),
                Some(other) => {
                    return Err(LedgerError::Storage(format!(
                        "bin {} holds {}, expected int",
                        bin,
                        other.kind()
                    )))
                }
            };
            record.bins.insert(bin.clone(), Value::Int(current));
            Ok(Value::Int(current))
        }

        Op::MapPutItems {
            bin,
            items,
            create_only,
        } => {
            let map = map_bin_or_create(record, bin)?;
            for (key, value) in items {
                require_finite(key, value)?;
                if *create_only && map.contains_key(key) {
                    return Err(duplicate_key(key));
                }
                map.insert(key.clone(), value.clone());
            }
            Ok(Value::Int(map.len() as i64))
        }

        Op::MapSize { bin } => {
            let size = match record.bins.get(bin) {
                None => 0,
                Some(Value::Map(map)) => map.len(),
                Some(other) => return Err(not_a_map(bin, other)),
            };
            Ok(Value::Int(size as i64))
        }

        Op::MapClear { bin } => {
            if let Some(map) = map_bin(record, bin)? {
                map.clear();
            }
            Ok(Value::Nil)
        }

        Op::MapModify {
            bin,
            key,
            path,
            selection,
            delta,
            clamp_max,
        } => {
            let entry = map_bin(record, bin)?
                .and_then(|map| map.get_mut(key))
                .ok_or_else(|| LedgerError::NotFound(format!("transaction {}", key)))?;

            let targets = selection.apply(path, path.resolve(entry)?)?;
            let mut updated = Vec::with_capacity(targets.len());
            for address in targets {
                match path::get_mut(entry, &address) {
                    Some(Value::Int(current)) => {
                        *current = current.saturating_add(*delta).min(*clamp_max);
                        updated.push(Value::Int(*current));
                    }
                    Some(other) => {
                        return Err(LedgerError::ShapeMismatch(format!(
                            "{} addresses a {}, expected int",
                            path,
                            other.kind()
                        )))
                    }
                    None => {
                        return Err(LedgerError::PathNotFound(format!(
                            "{} vanished during update",
                            path
                        )))
                    }
                }
            }
            Ok(Value::List(updated))
        }

        Op::MintAndPut {
            counter,
            bin,
            value,
        } => {
            let minted = match record.bins.get(counter) {
                None => 0,
                Some(Value::Int(next)) => *next,
                Some(other) => {
                    return Err(LedgerError::Storage(format!(
                        "bin {} holds {}, expected int",
                        counter,
                        other.kind()
                    )))
                }
            };
            let advanced = minted.checked_add(1).ok_or_else(|| {
                LedgerError::Storage(format!("counter {} exhausted", counter))
            })?;

            let slot = MapKey::Int(minted);
            require_finite(&slot, value)?;
            let map = map_bin_or_create(record, bin)?;
            if map.contains_key(&slot) {
                return Err(LedgerError::DuplicateId(minted));
            }
            map.insert(slot, value.clone());
            record.bins.insert(counter.clone(), Value::Int(advanced));
            Ok(Value::Int(minted))
        }

        Op::MapRemoveByValueRange {
            bin,
            key_path,
            start,
            end,
        } => {
            let Some(map) = map_bin(record, bin)? else {
                return Ok(Value::Int(0));
            };
            let before = map.len();
            map.retain(|_, value| {
                !matches!(ordering_key(value, key_path), Some(k) if k >= *start && k < *end)
            });
            Ok(Value::Int((before - map.len()) as i64))
        }
    }
}

fn map_bin<'a>(
    record: &'a mut Record,
    bin: &str,
) -> Result<Option<&'a mut BTreeMap<MapKey, Value>>> {
    match record.bins.get_mut(bin) {
        None => Ok(None),
        Some(Value::Map(map)) => Ok(Some(map)),
        Some(other) => Err(not_a_map(bin, other)),
    }
}

fn map_bin_or_create<'a>(
    record: &'a mut Record,
    bin: &str,
) -> Result<&'a mut BTreeMap<MapKey, Value>> {
    let value = record
        .bins
        .entry(bin.to_string())
        .or_insert_with(|| Value::Map(BTreeMap::new()));
    match value {
        Value::Map(map) => Ok(map),
        other => Err(not_a_map(bin, other)),
    }
}

/// Stored bins are JSON, which cannot hold NaN or infinities.
fn require_finite(key: &MapKey, value: &Value) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LedgerError::InvalidInput(format!(
            "entry {} holds a non-finite number",
            key
        )))
    }
}

fn not_a_map(bin: &str, value: &Value) -> LedgerError {
    LedgerError::ShapeMismatch(format!("bin {} holds {}, expected map", bin, value.kind()))
}

fn duplicate_key(key: &MapKey) -> LedgerError {
    match key {
        MapKey::Int(id) => LedgerError::DuplicateId(*id),
        MapKey::Str(name) => LedgerError::InvalidInput(format!("duplicate map key {}", name)),
    }
}
