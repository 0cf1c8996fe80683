//! Name lookups needed while compiling.
//!
//! A [`Resolver`] maps names written in queries to implementations:
//! transform functions, aggregators and predicate operators. It also decides
//! how destination keys are read (`"0"` as a position, `"name"` as a field).
//!
//! [`DefaultResolver`] ships the built-ins and can delegate unknown names to
//! a parent resolver, so applications layer their own names on top:
//!
//! ```
//! use std::sync::Arc;
//! use jsqn::{DefaultResolver, Value};
//!
//! let resolver = DefaultResolver::empty()
//!     .with_function("double", |args: &[Value]| match args.first() {
//!         Some(Value::Integer(n)) => Value::Integer(n * 2),
//!         _ => Value::Null,
//!     })
//!     .with_parent(Arc::new(DefaultResolver::new()));
//!
//! let selector = resolver
//!     .compile(&Value::from(serde_json::json!({
//!         "big": ["double", ["n"]],
//!         "up": ["uppercase", ["s"]],
//!     })))
//!     .unwrap();
//! let output = selector.apply(&Value::from(serde_json::json!({"n": 21, "s": "ok"})));
//! assert_eq!(output, Some(Value::from(serde_json::json!({"big": 42, "up": "OK"}))));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    aggregate::{Aggregation, builtin_aggregations},
    ast::Predicate,
    compiler::{CompiledSelector, compile_selector},
    error::CompileError,
    functions::builtin_functions,
    predicate::{PredicateFn, builtin_operators, compile_predicate},
    value::{Index, Value},
};

/// A function applied by `["name", ...args]` selectors. Must be total.
pub type TransformFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Compiles the operand of a reserved predicate key into a test.
pub type OperatorCompiler =
    Arc<dyn Fn(&Predicate, &dyn Resolver) -> Result<PredicateFn, CompileError> + Send + Sync>;

/// Lookups used by the selector and predicate compilers.
///
/// Only read during compilation; compiled selectors keep what they looked
/// up and never consult the resolver again.
pub trait Resolver: Send + Sync {
    fn resolve_function(&self, name: &str) -> Option<TransformFn>;

    fn resolve_aggregator(&self, name: &str) -> Option<Aggregation>;

    fn resolve_predicate_operator(&self, name: &str) -> Option<OperatorCompiler>;

    /// Destination key of a field selector entry.
    fn resolve_key(&self, raw: &str) -> Index {
        Index::parse(raw)
    }
}

/// Resolver backed by name tables, with optional delegation to a parent
/// for names it doesn't know.
#[derive(Clone)]
pub struct DefaultResolver {
    functions: HashMap<String, TransformFn>,
    aggregators: HashMap<String, Aggregation>,
    operators: HashMap<String, OperatorCompiler>,
    parent: Option<Arc<dyn Resolver>>,
}

impl Default for DefaultResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultResolver {
    /// Resolver with the built-in functions, aggregators and operators.
    pub fn new() -> Self {
        let mut resolver = Self::empty();
        for (name, function) in builtin_functions() {
            resolver.functions.insert(name.to_string(), function);
        }
        for (name, aggregation) in builtin_aggregations() {
            resolver.aggregators.insert(name.to_string(), aggregation);
        }
        for (name, operator) in builtin_operators() {
            resolver.operators.insert(name.to_string(), operator);
        }
        resolver
    }

    /// Resolver that knows no names.
    pub fn empty() -> Self {
        DefaultResolver {
            functions: HashMap::new(),
            aggregators: HashMap::new(),
            operators: HashMap::new(),
            parent: None,
        }
    }

    pub fn with_function<F>(mut self, name: &str, function: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.functions.insert(name.to_string(), Arc::new(function));
        self
    }

    pub fn with_aggregator(mut self, name: &str, aggregation: Aggregation) -> Self {
        self.aggregators.insert(name.to_string(), aggregation);
        self
    }

    pub fn with_operator<F>(mut self, name: &str, operator: F) -> Self
    where
        F: Fn(&Predicate, &dyn Resolver) -> Result<PredicateFn, CompileError>
            + Send
            + Sync
            + 'static,
    {
        self.operators.insert(name.to_string(), Arc::new(operator));
        self
    }

    /// Names not found here are looked up in `parent`.
    pub fn with_parent(mut self, parent: Arc<dyn Resolver>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Compiles a selector against this resolver.
    pub fn compile(&self, selector: &Value) -> Result<CompiledSelector, CompileError> {
        compile_selector(selector, self)
    }

    /// Compiles a predicate against this resolver.
    pub fn compile_predicate(&self, predicate: &Value) -> Result<PredicateFn, CompileError> {
        compile_predicate(predicate, self)
    }
}

impl Resolver for DefaultResolver {
    fn resolve_function(&self, name: &str) -> Option<TransformFn> {
        match self.functions.get(name) {
            Some(function) => Some(function.clone()),
            None => self.parent.as_ref()?.resolve_function(name),
        }
    }

    fn resolve_aggregator(&self, name: &str) -> Option<Aggregation> {
        match self.aggregators.get(name) {
            Some(aggregation) => Some(aggregation.clone()),
            None => self.parent.as_ref()?.resolve_aggregator(name),
        }
    }

    fn resolve_predicate_operator(&self, name: &str) -> Option<OperatorCompiler> {
        match self.operators.get(name) {
            Some(operator) => Some(operator.clone()),
            None => self.parent.as_ref()?.resolve_predicate_operator(name),
        }
    }
}
