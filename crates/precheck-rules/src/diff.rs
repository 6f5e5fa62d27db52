//! Field-level diff of map-valued parameters
//!
//! Nested maps are flattened to dotted leaf paths so rules can report one
//! finding per differing field instead of one per whole structure.

use precheck_model::{values_equal, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Values of one leaf across current, source default and target default
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValues<'v> {
    /// Dotted path below the parameter
    pub path: String,
    /// Observed leaf
    pub current: Option<&'v Value>,
    /// Source-default leaf
    pub source: Option<&'v Value>,
    /// Target-default leaf
    pub target: Option<&'v Value>,
}

/// Flatten nested maps to dotted leaf paths
///
/// Non-map values are a single leaf with an empty path.
#[must_use]
pub fn flatten_leaves(value: &Value) -> BTreeMap<String, &Value> {
    let mut leaves = BTreeMap::new();
    collect(value, String::new(), &mut leaves);
    leaves
}

fn collect<'v>(value: &'v Value, prefix: String, leaves: &mut BTreeMap<String, &'v Value>) {
    match value {
        Value::Map(entries) => {
            for (key, child) in entries {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect(child, path, leaves);
            }
        }
        other => {
            leaves.insert(prefix, other);
        }
    }
}

/// Whether the parameter should be diffed field by field
///
/// True when at least two of the values are present and every present value
/// is a map.
#[must_use]
pub fn is_map_parameter(values: &[Option<&Value>]) -> bool {
    let present: Vec<&Value> = values.iter().flatten().copied().collect();
    present.len() >= 2 && present.iter().all(|v| matches!(v, Value::Map(_)))
}

/// Leaves where current, source and target do not all agree
#[must_use]
pub fn differing_fields<'v>(
    current: Option<&'v Value>,
    source: Option<&'v Value>,
    target: Option<&'v Value>,
) -> Vec<FieldValues<'v>> {
    let flat = |v: Option<&'v Value>| v.map(flatten_leaves).unwrap_or_default();
    let (current, source, target) = (flat(current), flat(source), flat(target));

    let paths: BTreeSet<&String> = current
        .keys()
        .chain(source.keys())
        .chain(target.keys())
        .collect();
    paths
        .into_iter()
        .map(|path| FieldValues {
            path: path.clone(),
            current: current.get(path).copied(),
            source: source.get(path).copied(),
            target: target.get(path).copied(),
        })
        .filter(|field| {
            !(values_equal(field.current, field.source) && values_equal(field.source, field.target))
        })
        .collect()
}

/// Leaves where two values differ; the third slot is left empty
#[must_use]
pub fn differing_pairs<'v>(
    left: Option<&'v Value>,
    right: Option<&'v Value>,
) -> Vec<FieldValues<'v>> {
    let flat = |v: Option<&'v Value>| v.map(flatten_leaves).unwrap_or_default();
    let (left, right) = (flat(left), flat(right));

    let paths: BTreeSet<&String> = left.keys().chain(right.keys()).collect();
    paths
        .into_iter()
        .map(|path| FieldValues {
            path: path.clone(),
            current: left.get(path).copied(),
            source: right.get(path).copied(),
            target: None,
        })
        .filter(|field| !values_equal(field.current, field.source))
        .collect()
}

/// Join a parameter key and a field path
#[must_use]
pub fn field_key(key: &str, path: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{key}.{path}")
    }
}
