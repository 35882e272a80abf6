//! Context paths into nested values.
//!
//! A `ContextPath` is a sequence of `Step`s that walks from a transaction
//! value down to the sub-values an operation should touch. Resolution
//! produces concrete addresses so that callers can mutate the targets in
//! place without rebuilding the parent containers.

use std::fmt;

use crate::codec::ValueShape;
use crate::error::{LedgerError, Result};
use crate::value::{MapKey, Value};

/// One navigation step of a context path.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Map child with this key. Must exist.
    ByKey(MapKey),
    /// List element at this index; negative indices count from the end. Must exist.
    ByIndex(i64),
    /// Every list element or map value equal to this value.
    ByValueMatch(Value),
    /// Every child of a list or map.
    Wildcard,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::ByKey(MapKey::Str(key)) => write!(f, ".{}", key),
            Step::ByKey(MapKey::Int(key)) => write!(f, ".#{}", key),
            Step::ByIndex(index) => write!(f, "[{}]", index),
            Step::ByValueMatch(value) => write!(f, "{{={}}}", value),
            Step::Wildcard => write!(f, "[*]"),
        }
    }
}

/// How a mutating call treats multiple matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Apply to the first match in container order.
    First,
    /// Apply to every match.
    All,
    /// Fail with `AmbiguousPath` when more than one target matches.
    Unique,
}

impl Selection {
    /// Narrow resolved targets according to the policy.
    ///
    /// Zero targets is always `PathNotFound`.
    pub fn apply(self, path: &ContextPath, mut targets: Vec<Address>) -> Result<Vec<Address>> {
        if targets.is_empty() {
            return Err(LedgerError::PathNotFound(format!(
                "{} matched nothing",
                path
            )));
        }
        match self {
            Selection::First => targets.truncate(1),
            Selection::All => {}
            Selection::Unique => {
                if targets.len() > 1 {
                    return Err(LedgerError::AmbiguousPath {
                        path: path.to_string(),
                        matches: targets.len(),
                    });
                }
            }
        }
        Ok(targets)
    }
}

/// One concrete hop inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Index(usize),
    Key(MapKey),
}

/// Concrete location of a sub-value, relative to the root the path was
/// resolved against.
pub type Address = Vec<Slot>;

/// Declarative route to nested sub-values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContextPath {
    steps: Vec<Step>,
}

impl ContextPath {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// The empty path, addressing the value itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<MapKey>) -> Self {
        self.steps.push(Step::ByKey(key.into()));
        self
    }

    pub fn index(mut self, index: i64) -> Self {
        self.steps.push(Step::ByIndex(index));
        self
    }

    pub fn value_match(mut self, value: impl Into<Value>) -> Self {
        self.steps.push(Step::ByValueMatch(value.into()));
        self
    }

    pub fn wildcard(mut self) -> Self {
        self.steps.push(Step::Wildcard);
        self
    }

    /// Check the first step against the declared shape of the ledger values.
    ///
    /// Deeper steps are checked against the actual containers during
    /// resolution.
    pub fn validate(&self, shape: ValueShape) -> Result<()> {
        let Some(first) = self.steps.first() else {
            return Ok(());
        };
        let mismatch = match (shape, first) {
            (ValueShape::Flat, _) => true,
            (ValueShape::List, Step::ByKey(_)) => true,
            (ValueShape::Map, Step::ByIndex(_)) => true,
            _ => false,
        };
        if mismatch {
            return Err(LedgerError::ShapeMismatch(format!(
                "path {} cannot address a {} value",
                self, shape
            )));
        }
        Ok(())
    }

    /// Resolve the path against `root`, returning every addressed location in
    /// container order.
    pub fn resolve(&self, root: &Value) -> Result<Vec<Address>> {
        let mut frontier: Vec<(Address, &Value)> = vec![(Vec::new(), root)];

        for step in &self.steps {
            let mut next = Vec::new();
            for (address, value) in frontier {
                for (slot, child) in self.children(step, value)? {
                    let mut child_address = address.clone();
                    child_address.push(slot);
                    next.push((child_address, child));
                }
            }
            frontier = next;
        }

        Ok(frontier.into_iter().map(|(address, _)| address).collect())
    }

    /// Resolve and return references to the addressed values.
    pub fn resolve_values<'a>(&self, root: &'a Value) -> Result<Vec<&'a Value>> {
        let addresses = self.resolve(root)?;
        Ok(addresses
            .iter()
            .filter_map(|address| get(root, address))
            .collect())
    }

    fn children<'a>(&self, step: &Step, value: &'a Value) -> Result<Vec<(Slot, &'a Value)>> {
        match (step, value) {
            (Step::ByKey(key), Value::Map(map)) => match map.get(key) {
                Some(child) => Ok(vec![(Slot::Key(key.clone()), child)]),
                None => Err(LedgerError::PathNotFound(format!(
                    "{}: no key {}",
                    self, key
                ))),
            },
            (Step::ByIndex(index), Value::List(items)) => {
                let position = normalize_index(*index, items.len()).ok_or_else(|| {
                    LedgerError::PathNotFound(format!(
                        "{}: index {} out of bounds for length {}",
                        self,
                        index,
                        items.len()
                    ))
                })?;
                Ok(vec![(Slot::Index(position), &items[position])])
            }
            (Step::ByValueMatch(target), Value::List(items)) => Ok(items
                .iter()
                .enumerate()
                .filter(|(_, item)| *item == target)
                .map(|(position, item)| (Slot::Index(position), item))
                .collect()),
            (Step::ByValueMatch(target), Value::Map(map)) => Ok(map
                .iter()
                .filter(|(_, item)| *item == target)
                .map(|(key, item)| (Slot::Key(key.clone()), item))
                .collect()),
            (Step::Wildcard, Value::List(items)) => Ok(items
                .iter()
                .enumerate()
                .map(|(position, item)| (Slot::Index(position), item))
                .collect()),
            (Step::Wildcard, Value::Map(map)) => Ok(map
                .iter()
                .map(|(key, item)| (Slot::Key(key.clone()), item))
                .collect()),
            (step, other) => Err(LedgerError::ShapeMismatch(format!(
                "{}: step {} cannot descend into {}",
                self,
                step,
                other.kind()
            ))),
        }
    }
}

impl fmt::Display for ContextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for step in &self.steps {
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let position = if index < 0 { len + index } else { index };
    if (0..len).contains(&position) {
        usize::try_from(position).ok()
    } else {
        None
    }
}

/// Follow a resolved address.
pub fn get<'a>(root: &'a Value, address: &[Slot]) -> Option<&'a Value> {
    address.iter().try_fold(root, |value, slot| match (slot, value) {
        (Slot::Index(position), Value::List(items)) => items.get(*position),
        (Slot::Key(key), Value::Map(map)) => map.get(key),
        _ => None,
    })
}

/// Follow a resolved address mutably.
pub fn get_mut<'a>(root: &'a mut Value, address: &[Slot]) -> Option<&'a mut Value> {
    address.iter().try_fold(root, |value, slot| match slot {
        Slot::Index(position) => match value {
            Value::List(items) => items.get_mut(*position),
            _ => None,
        },
        Slot::Key(key) => match value {
            Value::Map(map) => map.get_mut(key),
            _ => None,
        },
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn nested() -> Value {
        // {"amount": 5, "splits": [[1, 10], [2, 20], [1, 30]]}
        let mut map = BTreeMap::new();
        map.insert(MapKey::from("amount"), Value::Int(5));
        map.insert(
            MapKey::from("splits"),
            Value::List(vec![
                Value::List(vec![Value::Int(1), Value::Int(10)]),
                Value::List(vec![Value::Int(2), Value::Int(20)]),
                Value::List(vec![Value::Int(1), Value::Int(30)]),
            ]),
        );
        Value::Map(map)
    }

    #[test]
    fn test_key_then_index() {
        let value = nested();
        let path = ContextPath::root().key("splits").index(1).index(1);
        let found = path.resolve_values(&value).unwrap();
        assert_eq!(found, vec![&Value::Int(20)]);
    }

    #[test]
    fn test_negative_index_counts_from_end() {
        let value = nested();
        let path = ContextPath::root().key("splits").index(-1).index(0);
        assert_eq!(path.resolve_values(&value).unwrap(), vec![&Value::Int(1)]);
    }

    #[test]
    fn test_wildcard_fans_out() {
        let value = nested();
        let path = ContextPath::root().key("splits").wildcard().index(1);
        let found = path.resolve_values(&value).unwrap();
        assert_eq!(
            found,
            vec![&Value::Int(10), &Value::Int(20), &Value::Int(30)]
        );
    }

    #[test]
    fn test_value_match_may_match_nothing() {
        let value = nested();
        let path = ContextPath::root().key("splits").wildcard().value_match(99i64);
        assert!(path.resolve(&value).unwrap().is_empty());
    }

    #[test]
    fn test_missing_key_is_path_not_found() {
        let value = nested();
        let err = ContextPath::root().key("fees").resolve(&value).unwrap_err();
        assert!(matches!(err, LedgerError::PathNotFound(_)));
    }

    #[test]
    fn test_index_out_of_bounds_is_path_not_found() {
        let value = nested();
        let err = ContextPath::root()
            .key("splits")
            .index(3)
            .resolve(&value)
            .unwrap_err();
        assert!(matches!(err, LedgerError::PathNotFound(_)));
    }

    #[test]
    fn test_index_into_map_is_shape_mismatch() {
        let value = nested();
        let err = ContextPath::root().index(0).resolve(&value).unwrap_err();
        assert!(matches!(err, LedgerError::ShapeMismatch(_)));
    }

    #[test]
    fn test_validate_against_shape() {
        assert!(ContextPath::root().index(1).validate(ValueShape::List).is_ok());
        assert!(ContextPath::root().key("amount").validate(ValueShape::Map).is_ok());
        assert!(ContextPath::root().validate(ValueShape::Flat).is_ok());

        for (path, shape) in [
            (ContextPath::root().index(1), ValueShape::Map),
            (ContextPath::root().key("amount"), ValueShape::List),
            (ContextPath::root().wildcard(), ValueShape::Flat),
        ] {
            let err = path.validate(shape).unwrap_err();
            assert!(matches!(err, LedgerError::ShapeMismatch(_)), "{}", path);
        }
    }

    #[test]
    fn test_selection_policies() {
        let value = nested();
        let path = ContextPath::root().key("splits").value_match(Value::List(vec![Value::Int(1), Value::Int(10)]));
        let wide = ContextPath::root().key("splits").wildcard();

        let first = Selection::First
            .apply(&wide, wide.resolve(&value).unwrap())
            .unwrap();
        assert_eq!(first.len(), 1);

        let all = Selection::All
            .apply(&wide, wide.resolve(&value).unwrap())
            .unwrap();
        assert_eq!(all.len(), 3);

        let err = Selection::Unique
            .apply(&wide, wide.resolve(&value).unwrap())
            .unwrap_err();
        assert!(matches!(err, LedgerError::AmbiguousPath { matches: 3, .. }));

        let unique = Selection::Unique
            .apply(&path, path.resolve(&value).unwrap())
            .unwrap();
        assert_eq!(unique, vec![vec![Slot::Key("splits".into()), Slot::Index(0)]]);
    }

    #[test]
    fn test_get_mut_edits_in_place() {
        let mut value = nested();
        let address = vec![Slot::Key("splits".into()), Slot::Index(2), Slot::Index(1)];
        *get_mut(&mut value, &address).unwrap() = Value::Int(31);
        assert_eq!(get(&value, &address), Some(&Value::Int(31)));
    }

    #[test]
    fn test_display() {
        let path = ContextPath::root().key("splits").wildcard().index(-1);
        assert_eq!(path.to_string(), "$.splits[*][-1]");
        assert_eq!(ContextPath::root().key(7i64).to_string(), "$.#7");
    }
}
