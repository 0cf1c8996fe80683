//! Selector compilation.
//!
//! Every selector node compiles into a [`CompileResult`]: where the node
//! reads from relative to its destination key, an optional mapper applied
//! to what was read, and the grouping and sorting directives it carries.
//! Field selectors turn their children's results into copiers (see
//! [`crate::fields`]); the top level turns the root result into a
//! [`CompiledSelector`].

use std::fmt;
use std::sync::Arc;

use crate::{
    aggregate::Aggregation,
    ast::{FieldSelector, Pipeline, Selector},
    error::CompileError,
    fields,
    output::to_json,
    resolver::{Resolver, TransformFn},
    value::{Index, Value},
};

/// Transformation applied to a read value. `None` in or out means absent.
pub(crate) type Mapper = Arc<dyn Fn(Option<&Value>) -> Option<Value> + Send + Sync>;

/// Compiled field selector: a whole node from input to output.
pub(crate) type NodeFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Where a compiled node reads from.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum Select {
    /// The destination is excluded
    Exclude,

    /// The source key equals the destination key
    #[default]
    Same,

    /// An explicit source key
    Key(Index),
}

#[derive(Clone, Default)]
pub(crate) struct CompileResult {
    pub select: Select,
    pub mapper: Option<Mapper>,
    pub aggregation: Option<Aggregation>,
    pub sort: Option<i64>,
}

impl CompileResult {
    fn reading(select: Select) -> Self {
        CompileResult {
            select,
            ..Default::default()
        }
    }

    fn mapped(select: Select, mapper: Mapper) -> Self {
        CompileResult {
            select,
            mapper: Some(mapper),
            ..Default::default()
        }
    }
}

pub(crate) fn apply_mapper(mapper: &Option<Mapper>, value: Option<&Value>) -> Option<Value> {
    match mapper {
        Some(mapper) => mapper(value),
        None => value.cloned(),
    }
}

fn misplaced(directive: &str, reason: &str) -> CompileError {
    CompileError::MisplacedDirective {
        directive: directive.to_string(),
        reason: reason.to_string(),
    }
}

/// Fails if `result` carries a sort or aggregation directive, which `place`
/// can't honour.
pub(crate) fn reject_directives(result: &CompileResult, place: &str) -> Result<(), CompileError> {
    if let Some(priority) = result.sort {
        return Err(misplaced(&priority.to_string(), &format!("sorting has no effect {}", place)));
    }
    if let Some(aggregation) = &result.aggregation {
        return Err(misplaced(
            &format!("{:?}", aggregation),
            &format!("aggregation has no effect {}", place),
        ));
    }
    Ok(())
}

/// A selector ready to be applied. Cheap to clone and safe to share between
/// threads; every call allocates its own grouping state.
#[derive(Clone)]
pub struct CompiledSelector {
    node: NodeFn,
}

impl CompiledSelector {
    /// Evaluates the selector. `None` means the input was filtered out or
    /// the selected value is absent.
    pub fn apply(&self, input: &Value) -> Option<Value> {
        (self.node)(input)
    }
}

impl fmt::Debug for CompiledSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompiledSelector(..)")
    }
}

/// Parses and compiles a selector value.
///
/// # Examples
///
/// ```
/// use jsqn::{DefaultResolver, Value, compile_selector};
///
/// let animals = Value::from(serde_json::json!([
///     {"kind": "dog", "name": "Luna", "weight": 10},
///     {"kind": "cat", "name": "Ola", "weight": 5},
///     {"kind": "dog", "name": "Bobo", "weight": 20},
/// ]));
///
/// let totals = compile_selector(
///     &Value::from(serde_json::json!({"kind": true, "weight": "sum"})),
///     &DefaultResolver::new(),
/// )
/// .unwrap();
///
/// assert_eq!(
///     totals.apply(&animals),
///     Some(Value::from(serde_json::json!([
///         {"kind": "dog", "weight": 30},
///         {"kind": "cat", "weight": 5},
///     ])))
/// );
/// ```
pub fn compile_selector(
    selector: &Value,
    resolver: &dyn Resolver,
) -> Result<CompiledSelector, CompileError> {
    let selector = Selector::parse(selector)?;
    let root = compile(&selector, resolver)?;
    reject_directives(&root, "on the top-level selector")?;

    let CompileResult { select, mapper, .. } = root;
    let node: NodeFn = match select {
        Select::Exclude => Arc::new(|_: &Value| None),
        Select::Same => Arc::new(move |input: &Value| apply_mapper(&mapper, Some(input))),
        Select::Key(key) => {
            Arc::new(move |input: &Value| apply_mapper(&mapper, input.index(&key)))
        }
    };
    Ok(CompiledSelector { node })
}

/// Compiles one selector node.
pub(crate) fn compile(
    selector: &Selector,
    resolver: &dyn Resolver,
) -> Result<CompileResult, CompileError> {
    match selector {
        Selector::Exclude => Ok(CompileResult::reading(Select::Exclude)),
        Selector::Copy => Ok(CompileResult::reading(Select::Same)),
        Selector::Sort(priority) => Ok(CompileResult {
            sort: Some(*priority),
            ..Default::default()
        }),
        Selector::Named(name) => compile_named(name, resolver),
        Selector::Pipeline(pipeline) => compile_pipeline(pipeline, resolver),
        Selector::Fields(fields) => compile_fields(fields, resolver),
    }
}

fn compile_named(name: &str, resolver: &dyn Resolver) -> Result<CompileResult, CompileError> {
    if let Some(aggregation) = resolver.resolve_aggregator(name) {
        return Ok(CompileResult {
            aggregation: Some(aggregation),
            ..Default::default()
        });
    }
    if let Some(function) = resolver.resolve_function(name) {
        return Ok(CompileResult::mapped(Select::Same, call_with_input(function)));
    }
    Err(CompileError::UnknownName(name.to_string()))
}

fn compile_fields(
    fields: &FieldSelector,
    resolver: &dyn Resolver,
) -> Result<CompileResult, CompileError> {
    let node = fields::compile(fields, resolver)?;
    Ok(CompileResult::mapped(
        Select::Same,
        Arc::new(move |value: Option<&Value>| node(value?)),
    ))
}

fn compile_pipeline(
    pipeline: &Pipeline,
    resolver: &dyn Resolver,
) -> Result<CompileResult, CompileError> {
    match pipeline {
        Pipeline::Identity => Ok(CompileResult::reading(Select::Same)),
        Pipeline::Access(key) => Ok(CompileResult::reading(Select::Key(key.clone()))),
        Pipeline::Constant(constant) => {
            let constant = constant.clone();
            Ok(CompileResult::mapped(
                Select::Same,
                Arc::new(move |_: Option<&Value>| Some(constant.clone())),
            ))
        }
        Pipeline::Nested(fields) => compile_fields(fields, resolver),
        Pipeline::Call { name, args } => compile_call(name, args, resolver),
        Pipeline::Chain { head, tail } => compile_chain(head, tail, resolver),
    }
}

/// `[name, args...]`. A bare `name` with no arguments goes through
/// `compile_named` instead, so `args` is never empty here.
fn compile_call(
    name: &str,
    args: &[Value],
    resolver: &dyn Resolver,
) -> Result<CompileResult, CompileError> {
    if let Some(function) = resolver.resolve_function(name) {
        return compile_function_call(name, function, args, resolver);
    }

    let Some(aggregation) = resolver.resolve_aggregator(name) else {
        return Err(CompileError::UnknownFunction(name.to_string()));
    };
    let rest = match args {
        [single] => Selector::parse(single)?,
        _ => Selector::Pipeline(Pipeline::parse(args)?),
    };
    let mut result = compile(&rest, resolver)?;
    if result.aggregation.is_some() {
        return Err(misplaced(name, "aggregations can't be nested"));
    }
    if result.select == Select::Exclude {
        return Err(misplaced(name, "an excluded field can't be aggregated"));
    }
    result.aggregation = Some(aggregation);
    Ok(result)
}

/// One argument of a function call.
enum Argument {
    Read(CompileResult),
    Constant(Value),
}

fn parse_argument(arg: &Value, resolver: &dyn Resolver) -> Result<Argument, CompileError> {
    let Value::Array(elements) = arg else {
        return Ok(Argument::Constant(arg.clone()));
    };
    if let [Value::Array(inner)] = elements.as_slice() {
        if let [constant] = inner.as_slice() {
            return Ok(Argument::Constant(constant.clone()));
        }
    }
    if elements.len() > 1 {
        return Ok(Argument::Constant(arg.clone()));
    }

    let read = compile_pipeline(&Pipeline::parse(elements)?, resolver)?;
    reject_directives(&read, "inside a function argument")?;
    Ok(Argument::Read(read))
}

/// `f(input)`, skipped when the input is absent.
fn call_with_input(function: TransformFn) -> Mapper {
    Arc::new(move |value: Option<&Value>| {
        let value = value?;
        Some(function(std::slice::from_ref(value)))
    })
}

fn compile_function_call(
    name: &str,
    function: TransformFn,
    args: &[Value],
    resolver: &dyn Resolver,
) -> Result<CompileResult, CompileError> {
    let unsupported = |reason: &str| CompileError::UnsupportedArguments {
        function: name.to_string(),
        reason: reason.to_string(),
    };

    let mut parsed = Vec::with_capacity(args.len());
    for arg in args {
        parsed.push(parse_argument(arg, resolver)?);
    }

    let reads: Vec<usize> = parsed
        .iter()
        .enumerate()
        .filter(|(_, arg)| matches!(arg, Argument::Read(_)))
        .map(|(i, _)| i)
        .collect();

    let [slot] = reads.as_slice() else {
        return Err(unsupported(&format!(
            "exactly one argument must read the input, found {} in {}",
            reads.len(),
            to_json(&Value::Array(args.to_vec()))
        )));
    };
    let slot = *slot;

    let mut template = Vec::with_capacity(parsed.len());
    let mut read = CompileResult::default();
    for arg in parsed {
        match arg {
            Argument::Read(result) => {
                read = result;
                template.push(Value::Null);
            }
            Argument::Constant(constant) => template.push(constant),
        }
    }
    if read.select == Select::Exclude {
        return Err(unsupported("an argument can't read an excluded field"));
    }

    let CompileResult { select, mapper: inner, .. } = read;
    let mapper: Mapper = if template.len() == 1 {
        Arc::new(move |value: Option<&Value>| {
            let value = apply_mapper(&inner, value)?;
            Some(function(&[value]))
        })
    } else {
        Arc::new(move |value: Option<&Value>| {
            let value = apply_mapper(&inner, value)?;
            let mut args = template.clone();
            args[slot] = value;
            Some(function(&args))
        })
    };
    Ok(CompileResult::mapped(select, mapper))
}

fn compile_chain(
    head: &Selector,
    tail: &Selector,
    resolver: &dyn Resolver,
) -> Result<CompileResult, CompileError> {
    let head = compile(head, resolver)?;
    if head.select == Select::Exclude {
        return Err(misplaced("false", "a chain can't start with an exclusion"));
    }
    let tail = compile(tail, resolver)?;
    if tail.select == Select::Exclude {
        return Err(misplaced("false", "a chain can't end with an exclusion"));
    }

    let step = fields::chain_step(&tail);
    let head_mapper = head.mapper;
    let mapper: Mapper = Arc::new(move |value: Option<&Value>| match &head_mapper {
        Some(head_mapper) => step(&head_mapper(value)?),
        None => step(value?),
    });

    Ok(CompileResult {
        select: head.select,
        mapper: Some(mapper),
        aggregation: tail.aggregation.or(head.aggregation),
        sort: head.sort.or(tail.sort),
    })
}
