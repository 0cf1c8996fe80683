//! Grouping of records by their non-aggregated fields.

use std::sync::Arc;

use indexmap::{IndexMap, map::Entry};

use crate::{
    aggregate::{Accumulator, Aggregation, Aggregator},
    fields::Row,
    output::to_canonical_json,
    value::Value,
};

/// Structural group key: the canonical JSON of every key value, `None` for
/// absent ones, then the select-all leftovers sorted by key. Two keys are
/// equal only when every component is.
type GroupKey = Vec<Option<String>>;

/// Grouping plan of a node. `folds[i]` is the aggregator of field `i`;
/// fields without one form the group key.
pub(crate) struct Grouping {
    folds: Vec<Option<Arc<dyn Aggregator>>>,
}

impl Grouping {
    /// `None` unless at least one field carries an aggregation directive.
    pub fn new(aggregations: &[Option<Aggregation>]) -> Option<Grouping> {
        if aggregations.iter().all(Option::is_none) {
            return None;
        }
        let folds = aggregations
            .iter()
            .map(|aggregation| match aggregation {
                Some(Aggregation::Fold(aggregator)) => Some(aggregator.clone()),
                Some(Aggregation::GroupBy) | None => None,
            })
            .collect();
        Some(Grouping { folds })
    }

    fn key(&self, row: &Row) -> GroupKey {
        let mut key: GroupKey = self
            .folds
            .iter()
            .zip(&row.values)
            .filter(|(fold, _)| fold.is_none())
            .map(|(_, value)| value.as_ref().map(to_canonical_json))
            .collect();
        let mut rest: Vec<(String, String)> = row
            .rest
            .iter()
            .map(|(index, value)| (index.to_string(), to_canonical_json(value)))
            .collect();
        rest.sort();
        for (index, value) in rest {
            key.push(Some(to_canonical_json(&Value::String(index))));
            key.push(Some(value));
        }
        key
    }

    /// The key fields of `row` with the aggregated fields left empty.
    fn template(&self, row: &Row) -> Row {
        Row {
            values: self
                .folds
                .iter()
                .zip(&row.values)
                .map(|(fold, value)| if fold.is_none() { value.clone() } else { None })
                .collect(),
            rest: row.rest.clone(),
        }
    }

    /// Folds `rows` into one row per distinct key, in first-seen order.
    pub fn fold(&self, rows: Vec<Row>) -> Vec<Row> {
        let mut groups: IndexMap<GroupKey, (Row, Vec<Option<Box<dyn Accumulator>>>)> =
            IndexMap::new();

        for mut row in rows {
            let (_, accumulators) = match groups.entry(self.key(&row)) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let accumulators = self
                        .folds
                        .iter()
                        .map(|fold| fold.as_ref().map(|aggregator| aggregator.create()))
                        .collect();
                    entry.insert((self.template(&row), accumulators))
                }
            };
            for (accumulator, value) in accumulators.iter_mut().zip(row.values.iter_mut()) {
                if let (Some(accumulator), Some(value)) = (accumulator.as_mut(), value.take()) {
                    accumulator.add(value);
                }
            }
        }

        groups
            .into_values()
            .map(|(mut row, accumulators)| {
                for (slot, accumulator) in row.values.iter_mut().zip(&accumulators) {
                    if let Some(accumulator) = accumulator {
                        *slot = Some(accumulator.get());
                    }
                }
                row
            })
            .collect()
    }
}
