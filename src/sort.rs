//! Ordering of distributed records by their sort directives.

use std::cmp::Ordering;

use crate::{fields::Row, value::Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SortKey {
    /// Position of the field in the node's field list
    pub field: usize,
    pub priority: u64,
    pub descending: bool,
}

/// Sort keys of a node, primary key first. `directives[i]` belongs to
/// field `i`.
pub(crate) fn sort_keys(directives: &[Option<i64>]) -> Vec<SortKey> {
    let mut keys: Vec<SortKey> = directives
        .iter()
        .enumerate()
        .filter_map(|(field, directive)| {
            directive.map(|n| SortKey {
                field,
                priority: n.unsigned_abs(),
                descending: n < 0,
            })
        })
        .collect();
    keys.sort_by_key(|key| key.priority);
    keys
}

fn rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Boolean(_)) => 2,
        Some(Value::Integer(_) | Value::Float(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

/// Total order used by sorting.
///
/// Numbers compare numerically, strings by code point and booleans
/// false-first. Values of different kinds are ordered by kind (absent,
/// null, booleans, numbers, strings, arrays, objects); arrays and objects
/// compare equal among themselves.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Boolean(a)), Some(Value::Boolean(b))) => a.cmp(b),
        (Some(Value::Integer(a)), Some(Value::Integer(b))) => a.cmp(b),
        (
            Some(a @ (Value::Integer(_) | Value::Float(_))),
            Some(b @ (Value::Integer(_) | Value::Float(_))),
        ) => {
            let (a, b) = (a.as_float().unwrap_or(0.0), b.as_float().unwrap_or(0.0));
            a.total_cmp(&b)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Stable multi-key sort of `rows`.
pub(crate) fn sort_rows(rows: &mut [Row], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for key in keys {
            let (a, b) = (a.values[key.field].as_ref(), b.values[key.field].as_ref());
            let ordering = compare_values(a, b);
            let ordering = if key.descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
