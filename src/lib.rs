pub mod aggregate;
pub mod ast;
pub mod compiler;
pub mod convert;
pub mod error;
mod fields;
pub mod functions;
mod group;
pub mod output;
pub mod parser;
pub mod predicate;
pub mod resolver;
mod sort;
pub mod value;

pub use aggregate::{Accumulator, Aggregation, Aggregator};
pub use ast::{FieldSelector, Pipeline, Predicate, Selector};
pub use compiler::{CompiledSelector, compile_selector};
pub use error::CompileError;
pub use output::{to_canonical_json, to_json, to_json_pretty};
pub use predicate::{PredicateFn, compile_predicate};
pub use resolver::{DefaultResolver, OperatorCompiler, Resolver, TransformFn};
pub use value::{Index, Map, Value};
