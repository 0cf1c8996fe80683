//! Field selector compilation: the copy engine.
//!
//! Compilation is two-phase. First every destination key of the field
//! selector is compiled into a [`FieldEntry`]. Then [`Strategy::choose`]
//! looks at the first entry to fix the key kinds of the node, and a
//! [`Copier`] is built for that strategy:
//!
//! | source keys | destination keys | copier |
//! |---|---|---|
//! | names | names | object to object, distributes over arrays |
//! | names | positions | object to array, distributes over arrays |
//! | positions | names | array to object |
//! | positions | positions | array to array |
//!
//! Entries whose key kinds disagree with the chosen strategy, and entries
//! writing a destination already written, are logged and skipped.
//!
//! A copier reads each record into a [`Row`] (one slot per field plus the
//! select-all leftovers), optionally groups and sorts the rows, and finally
//! writes each row into an object or an array.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    aggregate::Aggregation,
    ast::{FILTER_KEY, FieldSelector, SELECT_ALL_KEY},
    compiler::{self, CompileResult, Mapper, NodeFn, Select, apply_mapper, reject_directives},
    error::CompileError,
    group::Grouping,
    predicate::PredicateFn,
    resolver::Resolver,
    sort::{SortKey, sort_keys, sort_rows},
    value::{Index, Map, Value},
};

/// A compiled destination key.
pub(crate) enum FieldEntry {
    Field(FieldSpec),
    Exclude(Index),
}

pub(crate) struct FieldSpec {
    pub dest: Index,
    pub source: Index,
    pub mapper: Option<Mapper>,
    pub aggregation: Option<Aggregation>,
    pub sort: Option<i64>,
}

/// What happens to source entries no field reads.
pub(crate) enum Remaining {
    /// No `"*"` key: copied only when the node has no fields
    Unspecified,

    /// `"*": false`
    Dropped,

    /// `"*": true` or a selector applied to each remaining value
    Copied(Option<Mapper>),
}

/// One record on its way through a copier.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Row {
    /// Field values in field order; `None` is absent
    pub values: Vec<Option<Value>>,

    /// Select-all leftovers, keyed by their source key
    pub rest: Vec<(Index, Value)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyKind {
    Name,
    Position,
}

impl KeyKind {
    fn of(index: &Index) -> KeyKind {
        match index {
            Index::Name(_) => KeyKind::Name,
            Index::Position(_) => KeyKind::Position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Strategy {
    pub source: KeyKind,
    pub dest: KeyKind,
}

impl Strategy {
    /// The first entry fixes the strategy. An exclusion uses its key kind on
    /// both sides; no entries at all means object to object.
    pub fn choose(entries: &[FieldEntry]) -> Strategy {
        match entries.first() {
            Some(FieldEntry::Field(spec)) => Strategy {
                source: KeyKind::of(&spec.source),
                dest: KeyKind::of(&spec.dest),
            },
            Some(FieldEntry::Exclude(dest)) => Strategy {
                source: KeyKind::of(dest),
                dest: KeyKind::of(dest),
            },
            None => Strategy {
                source: KeyKind::Name,
                dest: KeyKind::Name,
            },
        }
    }
}

/// Largest tuple position a destination key may name. Array writers
/// allocate every slot up to it.
pub(crate) const MAX_TUPLE_POSITION: i64 = u16::MAX as i64;

/// Compiles a field selector into a node function.
pub(crate) fn compile(
    selector: &FieldSelector,
    resolver: &dyn Resolver,
) -> Result<NodeFn, CompileError> {
    let mut entries = Vec::with_capacity(selector.fields.len());
    for (raw, field) in &selector.fields {
        let dest = resolver.resolve_key(raw);
        if let Index::Position(position) = &dest {
            if *position > MAX_TUPLE_POSITION {
                return Err(CompileError::InvalidSelector {
                    fragment: raw.clone(),
                    reason: format!("tuple positions go up to {}", MAX_TUPLE_POSITION),
                }
                .at(raw));
            }
        }
        let result = compiler::compile(field, resolver).map_err(|e| e.at(raw))?;
        entries.push(entry(dest, result));
    }

    let remaining = match &selector.select_all {
        None => Remaining::Unspecified,
        Some(all) => {
            let result = compiler::compile(all, resolver).map_err(|e| e.at(SELECT_ALL_KEY))?;
            reject_directives(&result, "on select-all").map_err(|e| e.at(SELECT_ALL_KEY))?;
            match result.select {
                Select::Exclude => Remaining::Dropped,
                Select::Same => Remaining::Copied(result.mapper),
                Select::Key(key) => {
                    return Err(CompileError::InvalidSelector {
                        fragment: format!("[{}]", key),
                        reason: "select-all copies every remaining field and can't read one key"
                            .to_string(),
                    }
                    .at(SELECT_ALL_KEY));
                }
            }
        }
    };

    let filter = match &selector.filter {
        Some(predicate) => {
            let filter = predicate.compile(resolver).map_err(|e| e.at(FILTER_KEY))?;
            Some(filter)
        }
        None => None,
    };

    Ok(plan(entries, remaining, filter))
}

fn entry(dest: Index, result: CompileResult) -> FieldEntry {
    let source = match result.select {
        Select::Exclude => return FieldEntry::Exclude(dest),
        Select::Same => dest.clone(),
        Select::Key(source) => source,
    };
    FieldEntry::Field(FieldSpec {
        dest,
        source,
        mapper: result.mapper,
        aggregation: result.aggregation,
        sort: result.sort,
    })
}

/// Builds the copier for the strategy fixed by `entries`.
pub(crate) fn plan(
    entries: Vec<FieldEntry>,
    remaining: Remaining,
    filter: Option<PredicateFn>,
) -> NodeFn {
    let strategy = Strategy::choose(&entries);
    match (strategy.source, strategy.dest) {
        (KeyKind::Name, KeyKind::Name) => {
            build::<String, ObjectWriter>(strategy, entries, remaining, filter)
        }
        (KeyKind::Name, KeyKind::Position) => {
            build::<String, ArrayWriter>(strategy, entries, remaining, filter)
        }
        (KeyKind::Position, KeyKind::Name) => {
            build::<i64, ObjectWriter>(strategy, entries, remaining, filter)
        }
        (KeyKind::Position, KeyKind::Position) => {
            build::<i64, ArrayWriter>(strategy, entries, remaining, filter)
        }
    }
}

/// The tail of a chain, run over the value the head selected.
///
/// The tail becomes the only field of an array-destination node (`{"0":
/// tail}`), so it reads, distributes and broadcasts like any field. The
/// one-slot tuples that node writes are unwrapped again.
pub(crate) fn chain_step(tail: &CompileResult) -> NodeFn {
    let source = match &tail.select {
        Select::Key(key) => key.clone(),
        Select::Same | Select::Exclude => Index::Position(0),
    };
    let distributes = KeyKind::of(&source) == KeyKind::Name;
    let spec = FieldSpec {
        dest: Index::Position(0),
        source,
        mapper: tail.mapper.clone(),
        aggregation: None,
        sort: None,
    };
    let node = plan(vec![FieldEntry::Field(spec)], Remaining::Dropped, None);

    Arc::new(move |value: &Value| {
        let written = node(value)?;
        if distributes && value.is_array() {
            match written {
                Value::Array(tuples) => {
                    Some(Value::Array(tuples.into_iter().filter_map(first_slot).collect()))
                }
                _ => None,
            }
        } else {
            first_slot(written)
        }
    })
}

fn first_slot(tuple: Value) -> Option<Value> {
    match tuple {
        Value::Array(slots) => slots.into_iter().next(),
        _ => None,
    }
}

/// A key kind as seen by a copier.
pub(crate) trait Key: Clone + PartialEq + Send + Sync + 'static {
    fn narrow(index: &Index) -> Option<Self>;
}

impl Key for String {
    fn narrow(index: &Index) -> Option<Self> {
        match index {
            Index::Name(name) => Some(name.clone()),
            Index::Position(_) => None,
        }
    }
}

impl Key for i64 {
    fn narrow(index: &Index) -> Option<Self> {
        match index {
            Index::Position(position) => Some(*position),
            Index::Name(_) => None,
        }
    }
}

/// How a copier reads its input.
pub(crate) trait Source: Key {
    /// Whether an array input is a list of records rather than one record
    const DISTRIBUTES: bool;

    fn read<'a>(&self, input: &'a Value) -> Option<&'a Value>;

    /// The key of the entry `read` returns for `input`, as [`Source::entries`]
    /// names it.
    fn resolve(&self, input: &Value) -> Index;

    /// Every entry of `input` with its source key.
    fn entries(input: &Value) -> Vec<(Index, &Value)>;
}

impl Source for String {
    const DISTRIBUTES: bool = true;

    fn read<'a>(&self, input: &'a Value) -> Option<&'a Value> {
        input.get(self)
    }

    fn resolve(&self, _input: &Value) -> Index {
        Index::Name(self.clone())
    }

    fn entries(input: &Value) -> Vec<(Index, &Value)> {
        match input {
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| (Index::Name(key.clone()), value))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Position reads see an object as a one-element array.
impl Source for i64 {
    const DISTRIBUTES: bool = false;

    fn read<'a>(&self, input: &'a Value) -> Option<&'a Value> {
        match input {
            Value::Object(_) => (*self == 0 || *self == -1).then_some(input),
            _ => input.at(*self),
        }
    }

    fn resolve(&self, input: &Value) -> Index {
        let len = match input {
            Value::Array(items) => items.len() as i64,
            Value::Object(_) => 1,
            _ => 0,
        };
        if *self < 0 && len + *self >= 0 {
            Index::Position(len + *self)
        } else {
            Index::Position(*self)
        }
    }

    fn entries(input: &Value) -> Vec<(Index, &Value)> {
        match input {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, value)| (Index::Position(i as i64), value))
                .collect(),
            Value::Object(_) => vec![(Index::Position(0), input)],
            _ => Vec::new(),
        }
    }
}

/// How a copier writes a row.
pub(crate) trait Writer: Send + Sync + 'static {
    type Key: Key;

    /// Whether a record with an absent field is dropped
    const DROPS_INCOMPLETE: bool;

    fn new(dests: Vec<Self::Key>, excluded: Vec<Self::Key>) -> Self;

    /// Whether a select-all entry with this source key is already written
    /// by a field or excluded.
    fn claims(&self, key: &Index) -> bool;

    fn write(&self, row: Row) -> Value;
}

pub(crate) struct ObjectWriter {
    keys: Vec<String>,
    excluded: Vec<String>,
}

impl Writer for ObjectWriter {
    type Key = String;
    const DROPS_INCOMPLETE: bool = true;

    fn new(keys: Vec<String>, excluded: Vec<String>) -> Self {
        ObjectWriter { keys, excluded }
    }

    fn claims(&self, key: &Index) -> bool {
        let key = key.to_string();
        self.keys.contains(&key) || self.excluded.contains(&key)
    }

    fn write(&self, row: Row) -> Value {
        let mut object = Map::with_capacity(self.keys.len() + row.rest.len());
        for (key, value) in self.keys.iter().zip(row.values) {
            if let Some(value) = value {
                object.insert(key.clone(), value);
            }
        }
        for (key, value) in row.rest {
            object.entry(key.to_string()).or_insert(value);
        }
        Value::Object(object)
    }
}

/// Writes tuple slots (non-negative destinations) at their position, padded
/// with null, then ordering slots (negative destinations) in ascending key
/// order, skipping absent ones, then the select-all leftovers.
pub(crate) struct ArrayWriter {
    /// Field index written at each output position
    slots: Vec<Option<usize>>,
    tuple_len: usize,
    excluded: Vec<i64>,
}

impl Writer for ArrayWriter {
    type Key = i64;
    const DROPS_INCOMPLETE: bool = false;

    fn new(dests: Vec<i64>, excluded: Vec<i64>) -> Self {
        let tuple_len = dests
            .iter()
            .filter_map(|dest| usize::try_from(*dest).ok()?.checked_add(1))
            .max()
            .unwrap_or(0);

        let mut slots = vec![None; tuple_len];
        let mut ordering = Vec::new();
        for (field, dest) in dests.iter().enumerate() {
            match usize::try_from(*dest) {
                Ok(position) => slots[position] = Some(field),
                Err(_) => ordering.push((*dest, field)),
            }
        }
        ordering.sort_by_key(|(dest, _)| *dest);
        slots.extend(ordering.into_iter().map(|(_, field)| Some(field)));

        ArrayWriter {
            slots,
            tuple_len,
            excluded,
        }
    }

    fn claims(&self, key: &Index) -> bool {
        match key {
            Index::Position(position) => {
                self.excluded.contains(position)
                    || (*position >= 0
                        && (*position as usize) < self.tuple_len
                        && self.slots[*position as usize].is_some())
            }
            Index::Name(_) => false,
        }
    }

    fn write(&self, row: Row) -> Value {
        let Row { mut values, mut rest } = row;
        let mut array = Vec::with_capacity(self.slots.len() + rest.len());

        for (position, slot) in self.slots.iter().enumerate() {
            let value = match slot {
                Some(field) => values[*field].take(),
                None => {
                    let hole = Index::Position(position as i64);
                    let found = rest.iter().position(|(key, _)| *key == hole);
                    found.map(|i| rest.remove(i).1)
                }
            };
            if position < self.tuple_len {
                array.push(value.unwrap_or(Value::Null));
            } else if let Some(value) = value {
                array.push(value);
            }
        }
        array.extend(rest.into_iter().map(|(_, value)| value));
        Value::Array(array)
    }
}

struct Field<S> {
    source: S,
    mapper: Option<Mapper>,
}

/// Copier for one strategy: reads with `S`, writes with `W`.
pub(crate) struct Copier<S: Source, W: Writer> {
    fields: Vec<Field<S>>,
    remaining: Option<Option<Mapper>>,
    filter: Option<PredicateFn>,
    /// A filter-only node hands terminals through unchanged
    passthrough: bool,
    grouping: Option<Grouping>,
    sort: Vec<SortKey>,
    writer: W,
}

fn build<S: Source, W: Writer>(
    strategy: Strategy,
    entries: Vec<FieldEntry>,
    remaining: Remaining,
    filter: Option<PredicateFn>,
) -> NodeFn {
    let mut written: Vec<Index> = Vec::with_capacity(entries.len());
    let mut fields = Vec::with_capacity(entries.len());
    let mut dests = Vec::with_capacity(entries.len());
    let mut excluded = Vec::new();
    let mut aggregations = Vec::with_capacity(entries.len());
    let mut directives = Vec::with_capacity(entries.len());

    for entry in entries {
        match entry {
            FieldEntry::Field(spec) => {
                let source = S::narrow(&spec.source);
                let (Some(source), Some(dest)) = (source, W::Key::narrow(&spec.dest)) else {
                    warn!(
                        source = %spec.source,
                        dest = %spec.dest,
                        ?strategy,
                        "field keys don't match the copy strategy, ignoring field"
                    );
                    continue;
                };
                if written.contains(&spec.dest) {
                    warn!(key = %spec.dest, "destination key written twice, ignoring field");
                    continue;
                }
                written.push(spec.dest);
                fields.push(Field {
                    source,
                    mapper: spec.mapper,
                });
                dests.push(dest);
                aggregations.push(spec.aggregation);
                directives.push(spec.sort);
            }
            FieldEntry::Exclude(key) => {
                let Some(dest) = W::Key::narrow(&key) else {
                    warn!(
                        key = %key,
                        ?strategy,
                        "excluded key doesn't match the copy strategy, ignoring it"
                    );
                    continue;
                };
                if written.contains(&key) {
                    warn!(key = %key, "destination key written twice, ignoring exclusion");
                    continue;
                }
                written.push(key);
                excluded.push(dest);
            }
        }
    }

    let (remaining, passthrough) = match remaining {
        Remaining::Copied(mapper) => (Some(mapper), false),
        Remaining::Dropped => (None, false),
        Remaining::Unspecified if fields.is_empty() => (Some(None), filter.is_some()),
        Remaining::Unspecified => (None, false),
    };
    let grouping = Grouping::new(&aggregations);
    let sort = sort_keys(&directives);

    debug!(
        ?strategy,
        fields = fields.len(),
        grouped = grouping.is_some(),
        sorted = !sort.is_empty(),
        "copy strategy fixed"
    );

    let copier = Copier::<S, W> {
        fields,
        remaining,
        filter,
        passthrough,
        grouping,
        sort,
        writer: W::new(dests, excluded),
    };
    Arc::new(move |input: &Value| copier.apply(input))
}

impl<S: Source, W: Writer> Copier<S, W> {
    fn apply(&self, input: &Value) -> Option<Value> {
        if S::DISTRIBUTES {
            if let Value::Array(items) = input {
                return Some(self.distribute(items));
            }
        }
        if !self.passes(input) {
            return None;
        }
        if self.passthrough && input.is_terminal() {
            return Some(input.clone());
        }

        let row = self.extract(input)?;
        let row = match &self.grouping {
            Some(grouping) => grouping.fold(vec![row]).pop()?,
            None => row,
        };
        Some(self.writer.write(row))
    }

    fn passes(&self, input: &Value) -> bool {
        match &self.filter {
            Some(filter) => filter(Some(input)),
            None => true,
        }
    }

    fn distribute(&self, items: &[Value]) -> Value {
        if self.grouping.is_none() && self.sort.is_empty() {
            return Value::Array(items.iter().filter_map(|item| self.apply(item)).collect());
        }

        let mut rows = Vec::with_capacity(items.len());
        let mut nested = Vec::new();
        for item in items {
            if item.is_array() {
                nested.extend(self.apply(item));
            } else if self.passes(item) {
                rows.extend(self.extract(item));
            }
        }

        if let Some(grouping) = &self.grouping {
            rows = grouping.fold(rows);
        }
        sort_rows(&mut rows, &self.sort);

        let mut output: Vec<Value> = rows.into_iter().map(|row| self.writer.write(row)).collect();
        output.extend(nested);
        Value::Array(output)
    }

    /// Reads one record. Terminals broadcast into every field.
    fn extract(&self, input: &Value) -> Option<Row> {
        if input.is_terminal() {
            let values = self
                .fields
                .iter()
                .map(|field| apply_mapper(&field.mapper, Some(input)).or(Some(Value::Null)))
                .collect();
            return Some(Row {
                values,
                rest: Vec::new(),
            });
        }

        let values: Vec<Option<Value>> = self
            .fields
            .iter()
            .map(|field| apply_mapper(&field.mapper, field.source.read(input)))
            .collect();
        if W::DROPS_INCOMPLETE && values.iter().any(Option::is_none) {
            return None;
        }

        let rest = match &self.remaining {
            Some(mapper) => self.leftovers(input, mapper),
            None => Vec::new(),
        };
        Some(Row { values, rest })
    }

    fn leftovers(&self, input: &Value, mapper: &Option<Mapper>) -> Vec<(Index, Value)> {
        let read: Vec<Index> = self
            .fields
            .iter()
            .map(|field| field.source.resolve(input))
            .collect();
        S::entries(input)
            .into_iter()
            .filter(|(key, _)| !read.contains(key) && !self.writer.claims(key))
            .filter_map(|(key, value)| {
                apply_mapper(mapper, Some(value)).map(|value| (key, value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(dest: Index, source: Index) -> FieldEntry {
        FieldEntry::Field(FieldSpec {
            dest,
            source,
            mapper: None,
            aggregation: None,
            sort: None,
        })
    }

    #[test]
    fn first_entry_fixes_the_strategy() {
        let entries = vec![field(Index::Position(0), "a".into()), field("b".into(), "b".into())];
        assert_eq!(
            Strategy::choose(&entries),
            Strategy {
                source: KeyKind::Name,
                dest: KeyKind::Position
            }
        );
        assert_eq!(
            Strategy::choose(&[FieldEntry::Exclude(Index::Position(1))]),
            Strategy {
                source: KeyKind::Position,
                dest: KeyKind::Position
            }
        );
        assert_eq!(
            Strategy::choose(&[]),
            Strategy {
                source: KeyKind::Name,
                dest: KeyKind::Name
            }
        );
    }

    #[test]
    fn array_writer_places_tuple_then_ordering_slots() {
        let writer = ArrayWriter::new(vec![-1, 2, -3, 0], Vec::new());
        assert_eq!(writer.slots, vec![Some(3), None, Some(1), Some(2), Some(0)]);
        assert_eq!(writer.tuple_len, 3);

        let row = Row {
            values: vec![
                Some(Value::Integer(10)),
                Some(Value::Integer(2)),
                None,
                Some(Value::Integer(0)),
            ],
            rest: vec![(Index::Position(1), Value::Integer(1))],
        };
        assert_eq!(
            writer.write(row),
            Value::Array(vec![
                Value::Integer(0),
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(10),
            ])
        );
    }

    #[test]
    fn negative_reads_resolve_against_the_input() {
        let items = Value::from(serde_json::json!(["a", "b", "c"]));
        assert_eq!((-1i64).resolve(&items), Index::Position(2));
        assert_eq!((-4i64).resolve(&items), Index::Position(-4));
        assert_eq!(1i64.resolve(&items), Index::Position(1));

        let record = Value::from(serde_json::json!({"a": 1}));
        assert_eq!((-1i64).resolve(&record), Index::Position(0));
    }

    #[test]
    fn extreme_negative_destinations_stay_out_of_the_tuple() {
        let writer = ArrayWriter::new(vec![i64::MIN, 1], Vec::new());
        assert_eq!(writer.tuple_len, 2);
        assert_eq!(writer.slots, vec![None, Some(1), Some(0)]);
    }

    #[test]
    fn mismatched_fields_are_skipped() {
        let node = plan(
            vec![field("a".into(), "a".into()), field("b".into(), Index::Position(0))],
            Remaining::Unspecified,
            None,
        );
        let input = Value::from(serde_json::json!({"a": 1, "b": 2}));
        assert_eq!(node(&input), Some(Value::from(serde_json::json!({"a": 1}))));
    }
}
