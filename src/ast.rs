//! # jsqn - Query Syntax Tree
//!
//! A jsqn query is written as data: a JSON value whose shape says what to
//! do. Before compilation that value is parsed into the closed types of this
//! module so every later stage matches exhaustively on a known set of forms.
//!
//! - **[selector]** - [`Selector`], [`Pipeline`] and [`FieldSelector`]
//! - **[predicate]** - [`Predicate`]
//!
//! ## Selector forms
//!
//! | Value | Meaning |
//! |---|---|
//! | `false`, `null` | exclude the destination field |
//! | `true` | copy the same-named field |
//! | `3`, `-1` | sort directive (priority 3 ascending, priority 1 descending) |
//! | `"sum"` | aggregation or grouping directive |
//! | `[...]` | pipeline: accessor, constant, function call or chain |
//! | `{...}` | field selector: one nested selector per destination key |
//!
//! ## Reserved keys
//!
//! Inside a field selector, `"*"` selects every field not otherwise claimed
//! and `"?"` attaches a [`Predicate`] that filters the records of the node.
//!
//! ## Example
//!
//! ```text
//! { "name": true, "kind": 1, "weight": -2, "?": { "kind": ["cat", "dog"] } }
//! ```
//!
//! Keeps cats and dogs, copies three fields, sorts by kind ascending and then
//! by weight descending.

pub mod predicate;
pub mod selector;

pub use predicate::Predicate;
pub use selector::{FieldSelector, Pipeline, Selector};

/// Field selector key that selects all remaining source fields.
pub const SELECT_ALL_KEY: &str = "*";

/// Field selector key whose value is a filtering predicate.
pub const FILTER_KEY: &str = "?";
