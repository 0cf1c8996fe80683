//! Parsing of query values into the syntax tree.
//!
//! Only the shape of the value is checked here. Names (functions,
//! aggregators, predicate operators) are resolved later by the compiler.

use crate::{
    ast::{FILTER_KEY, FieldSelector, Pipeline, Predicate, SELECT_ALL_KEY, Selector},
    error::CompileError,
    output::to_json,
    value::{Index, Map, Value},
};

fn invalid_selector(value: &Value, reason: &str) -> CompileError {
    CompileError::InvalidSelector {
        fragment: to_json(value),
        reason: reason.to_string(),
    }
}

impl Selector {
    /// Parses a selector value.
    ///
    /// # Examples
    ///
    /// ```
    /// use jsqn::{Selector, Value};
    /// use jsqn::ast::Pipeline;
    ///
    /// let selector = Selector::parse(&Value::from(serde_json::json!(["name"]))).unwrap();
    /// assert_eq!(selector, Selector::Pipeline(Pipeline::Access("name".into())));
    /// ```
    pub fn parse(value: &Value) -> Result<Selector, CompileError> {
        match value {
            Value::Null | Value::Boolean(false) => Ok(Selector::Exclude),
            Value::Boolean(true) => Ok(Selector::Copy),
            Value::Integer(0) => Err(invalid_selector(value, "sort priority must be nonzero")),
            Value::Integer(n) => Ok(Selector::Sort(*n)),
            Value::Float(_) => Err(invalid_selector(
                value,
                "sort directive must be an integer priority",
            )),
            Value::String(name) => Ok(Selector::Named(name.clone())),
            Value::Array(elements) => Pipeline::parse(elements).map(Selector::Pipeline),
            Value::Object(map) => FieldSelector::parse(map).map(Selector::Fields),
        }
    }
}

impl Pipeline {
    /// Parses the elements of an array selector.
    pub fn parse(elements: &[Value]) -> Result<Pipeline, CompileError> {
        let (first, rest) = match elements.split_first() {
            Some(split) => split,
            None => return Ok(Pipeline::Identity),
        };

        if rest.is_empty() {
            return Self::parse_accessor(first);
        }

        if let Value::String(name) = first {
            return Ok(Pipeline::Call {
                name: name.clone(),
                args: rest.to_vec(),
            });
        }

        let head = Selector::parse(first)?;
        let tail = match rest {
            [single] => Selector::parse(single)?,
            _ => Selector::Pipeline(Pipeline::parse(rest)?),
        };

        Ok(Pipeline::Chain {
            head: Box::new(head),
            tail: Box::new(tail),
        })
    }

    fn parse_accessor(element: &Value) -> Result<Pipeline, CompileError> {
        match element {
            Value::String(name) => Ok(Pipeline::Access(Index::Name(name.clone()))),
            Value::Integer(position) => Ok(Pipeline::Access(Index::Position(*position))),
            Value::Array(inner) => match inner.as_slice() {
                [constant] => Ok(Pipeline::Constant(constant.clone())),
                _ => Err(invalid_selector(
                    element,
                    "a constant is written [[value]] with exactly one value",
                )),
            },
            Value::Object(map) => FieldSelector::parse(map).map(Pipeline::Nested),
            Value::Null | Value::Boolean(_) | Value::Float(_) => Err(invalid_selector(
                element,
                "an accessor must be a field name, an integer index, [constant] \
                 or an object selector",
            )),
        }
    }
}

impl FieldSelector {
    /// Parses an object selector, separating the reserved keys.
    pub fn parse(map: &Map) -> Result<FieldSelector, CompileError> {
        let mut selector = FieldSelector::default();

        for (key, value) in map {
            match key.as_str() {
                SELECT_ALL_KEY => {
                    let all = Selector::parse(value).map_err(|e| e.at(key))?;
                    selector.select_all = Some(Box::new(all));
                }
                FILTER_KEY => {
                    let filter = Predicate::parse(value).map_err(|e| e.at(key))?;
                    selector.filter = Some(filter);
                }
                _ => {
                    let field = Selector::parse(value).map_err(|e| e.at(key))?;
                    selector.fields.push((key.clone(), field));
                }
            }
        }

        Ok(selector)
    }
}

impl Predicate {
    /// Parses a predicate value.
    ///
    /// Fails for an OR list containing another OR list, which has no
    /// defined meaning.
    pub fn parse(value: &Value) -> Result<Predicate, CompileError> {
        match value {
            Value::Object(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (key, nested) in map {
                    let nested = Predicate::parse(nested).map_err(|e| e.at(key))?;
                    entries.push((key.clone(), nested));
                }
                Ok(Predicate::All(entries))
            }
            Value::Array(alternatives) => {
                let mut parsed = Vec::with_capacity(alternatives.len());
                for alternative in alternatives {
                    if alternative.is_array() {
                        return Err(CompileError::NestedDisjunction {
                            fragment: to_json(value),
                        });
                    }
                    parsed.push(Predicate::parse(alternative)?);
                }
                Ok(Predicate::Any(parsed))
            }
            terminal => Ok(Predicate::Equals(terminal.clone())),
        }
    }
}
