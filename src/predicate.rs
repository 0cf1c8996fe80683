//! Predicate compilation.
//!
//! A predicate compiles into a [`PredicateFn`] that takes the tested value
//! as `Option<&Value>`: `None` stands for a missing field, which is unequal
//! to everything (including `null`).

use std::cmp::Ordering;
use std::sync::Arc;

use regex::Regex;

use crate::{
    ast::Predicate,
    error::CompileError,
    output::to_json,
    resolver::{OperatorCompiler, Resolver},
    value::{Value, partial_compare},
};

/// Compiled boolean test.
pub type PredicateFn = Arc<dyn Fn(Option<&Value>) -> bool + Send + Sync>;

/// Negation of the nested predicate
pub const NOT_OP: &str = "!";
pub const LT_OP: &str = "<";
pub const LE_OP: &str = "<=";
pub const GE_OP: &str = ">=";
pub const GT_OP: &str = ">";
/// Regular expression match against a string
pub const MATCH_OP: &str = "~";

fn test<F>(f: F) -> PredicateFn
where
    F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Parses and compiles a predicate value.
///
/// # Examples
///
/// ```
/// use jsqn::{DefaultResolver, Value, compile_predicate};
///
/// let resolver = DefaultResolver::new();
/// let heavy_dog = compile_predicate(
///     &Value::from(serde_json::json!({"kind": "dog", "weight": {">": 15}})),
///     &resolver,
/// )
/// .unwrap();
///
/// let bobo = Value::from(serde_json::json!({"kind": "dog", "weight": 20}));
/// let luna = Value::from(serde_json::json!({"kind": "dog", "weight": 10}));
/// assert!(heavy_dog(Some(&bobo)));
/// assert!(!heavy_dog(Some(&luna)));
/// assert!(!heavy_dog(None));
/// ```
pub fn compile_predicate(
    predicate: &Value,
    resolver: &dyn Resolver,
) -> Result<PredicateFn, CompileError> {
    Predicate::parse(predicate)?.compile(resolver)
}

impl Predicate {
    pub fn compile(&self, resolver: &dyn Resolver) -> Result<PredicateFn, CompileError> {
        match self {
            Predicate::Equals(expected) => {
                let expected = expected.clone();
                Ok(test(move |v| v == Some(&expected)))
            }
            Predicate::All(entries) => compile_all(entries, resolver),
            Predicate::Any(alternatives) => compile_any(alternatives, resolver),
        }
    }
}

/// Value of `key` inside `v`. A null (or missing) container is passed on
/// as-is so the nested predicate decides what it means.
fn descend<'a>(v: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    match v? {
        Value::Null => v,
        Value::Object(map) => map.get(key),
        array @ Value::Array(_) => key.parse::<i64>().ok().and_then(|i| array.at(i)),
        _ => None,
    }
}

fn compile_all(
    entries: &[(String,
    Predicate)],
    resolver: &dyn Resolver,
) -> Result<PredicateFn, CompileError> {
    let mut tests: Vec<PredicateFn> = Vec::with_capacity(entries.len());

    for (key, nested) in entries {
        let compiled = match resolver.resolve_predicate_operator(key) {
            Some(operator) => operator(nested, resolver).map_err(|e| e.at(key))?,
            None => {
                let nested = nested.compile(resolver).map_err(|e| e.at(key))?;
                let key = key.clone();
                test(move |v| nested(descend(v, &key)))
            }
        };
        tests.push(compiled);
    }

    Ok(match tests.len() {
        0 => test(|_| true),
        1 => tests.remove(0),
        _ => test(move |v| tests.iter().all(|t| t(v))),
    })
}

fn compile_any(
    alternatives: &[Predicate],
    resolver: &dyn Resolver,
) -> Result<PredicateFn, CompileError> {
    let mut tests: Vec<PredicateFn> = Vec::with_capacity(alternatives.len());
    for alternative in alternatives {
        if let Predicate::Any(_) = alternative {
            return Err(CompileError::NestedDisjunction {
                fragment: format!("{:?}", alternative),
            });
        }
        tests.push(alternative.compile(resolver)?);
    }

    Ok(match tests.len() {
        0 => test(|_| false),
        1 => tests.remove(0),
        _ => test(move |v| tests.iter().any(|t| t(v))),
    })
}

fn compile_not(operand: &Predicate, resolver: &dyn Resolver) -> Result<PredicateFn, CompileError> {
    let inner = operand.compile(resolver)?;
    Ok(test(move |v| !inner(v)))
}

fn literal_operand<'a>(operator: &str, operand: &'a Predicate) -> Result<&'a Value, CompileError> {
    match operand {
        Predicate::Equals(literal) => Ok(literal),
        Predicate::All(_) => Err(CompileError::InvalidOperand {
            operator: operator.to_string(),
            reason: "expected a literal, got an object".to_string(),
        }),
        Predicate::Any(_) => Err(CompileError::InvalidOperand {
            operator: operator.to_string(),
            reason: "expected a literal, got an array".to_string(),
        }),
    }
}

fn comparison(operator: &'static str, accept: fn(Ordering) -> bool) -> OperatorCompiler {
    Arc::new(
        move |operand: &Predicate, _resolver: &dyn Resolver| -> Result<PredicateFn, CompileError> {
            let literal = literal_operand(operator, operand)?.clone();
            Ok(test(move |v| {
                v.and_then(|v| partial_compare(v, &literal)).is_some_and(accept)
            }))
        },
    )
}

fn compile_match(
    operand: &Predicate,
    _resolver: &dyn Resolver,
) -> Result<PredicateFn, CompileError> {
    let pattern = match literal_operand(MATCH_OP, operand)? {
        Value::String(pattern) => pattern,
        other => {
            return Err(CompileError::InvalidOperand {
                operator: MATCH_OP.to_string(),
                reason: format!("pattern must be a string, got {}", to_json(other)),
            });
        }
    };
    let re = Regex::new(pattern).map_err(|e| CompileError::InvalidRegex {
        pattern: pattern.clone(),
        message: e.to_string(),
    })?;

    Ok(test(move |v| v.and_then(Value::as_str).is_some_and(|s| re.is_match(s))))
}

/// The operators registered by [`crate::DefaultResolver::new`].
pub fn builtin_operators() -> Vec<(&'static str, OperatorCompiler)> {
    vec![
        (NOT_OP, Arc::new(compile_not) as OperatorCompiler),
        (LT_OP, comparison(LT_OP, Ordering::is_lt)),
        (LE_OP, comparison(LE_OP, Ordering::is_le)),
        (GE_OP, comparison(GE_OP, Ordering::is_ge)),
        (GT_OP, comparison(GT_OP, Ordering::is_gt)),
        (MATCH_OP, Arc::new(compile_match) as OperatorCompiler),
    ]
}
