use crate::value::Value;

/// A boolean test written as data.
///
/// # Examples
/// ```text
/// "cat"                                // equal to "cat"
/// { "kind": "dog", "name": "Bobo" }    // kind is dog AND name is Bobo
/// [{ "kind": "lion" }, { "name": "Ola" }] // kind is lion OR name is Ola
/// { "weight": { ">=": 5, "!": 10 } }   // weight at least 5 and not 10
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Terminal value: structural equality
    Equals(Value),

    /// Object: every entry must hold
    ///
    /// Each key is either an operator known to the resolver or a field name
    /// whose value is tested by the nested predicate.
    All(Vec<(String, Predicate)>),

    /// Array: at least one element must hold
    ///
    /// Elements are never `Any` themselves.
    Any(Vec<Predicate>),
}
