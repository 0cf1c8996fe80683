use crate::ast::Predicate;
use crate::value::{Index, Value};

/// One node of a selector.
///
/// Selectors describe the output: which destination fields exist, where
/// each one reads from and how the read value is transformed, grouped or
/// used for ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Drop the destination field (`false` or `null`)
    Exclude,

    /// Copy the source field with the same key (`true`)
    Copy,

    /// Copy the same-named field and order results by it
    ///
    /// `|n|` is the priority (1 compares first), the sign is the direction.
    ///
    /// # Examples
    /// ```text
    /// { "kind": 1, "weight": -2 }   // kind ascending, then weight descending
    /// ```
    Sort(i64),

    /// Aggregation or grouping directive resolved by name
    ///
    /// # Examples
    /// ```text
    /// { "kind": true, "weight": "sum" }
    /// { "kind": "group" }
    /// ```
    Named(String),

    /// Transformation of the current value (`[...]`)
    Pipeline(Pipeline),

    /// Output structure (`{...}`)
    Fields(FieldSelector),
}

/// An array selector: a transformation applied to the value being selected.
#[derive(Debug, Clone, PartialEq)]
pub enum Pipeline {
    /// `[]` - read the field named by the destination key
    Identity,

    /// `["name"]`, `[0]`, `[-1]` - read a field or element
    Access(Index),

    /// `[[value]]` - ignore the input and produce `value`
    Constant(Value),

    /// `[{...}]` - apply a field selector to the value
    Nested(FieldSelector),

    /// `["name", arg, ...]` - call a function, or aggregate the rest of the
    /// pipeline when `name` is an aggregator
    ///
    /// Arguments are kept as written; whether they are read as function
    /// arguments or as a pipeline depends on what `name` resolves to.
    Call { name: String, args: Vec<Value> },

    /// `[head, ...tail]` - select with `head`, then feed the result to `tail`
    ///
    /// # Examples
    /// ```text
    /// [[0], ["is"]]               // element 0, then its "is" field
    /// [[0], "uppercase", ["name"]] // element 0, then uppercase of its name
    /// ```
    Chain { head: Box<Selector>, tail: Box<Selector> },
}

/// An object selector mapping destination keys to nested selectors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldSelector {
    /// Destination keys as written, in declaration order
    pub fields: Vec<(String, Selector)>,

    /// Selector of the `"*"` key
    pub select_all: Option<Box<Selector>>,

    /// Predicate of the `"?"` key
    pub filter: Option<Predicate>,
}

