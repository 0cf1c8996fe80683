use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;

/// Object storage. Insertion order is kept for stable output but is not
/// significant for equality.
pub type Map = IndexMap<String, Value>;

/// A JSON value: the data being queried, the query results, and the
/// selectors and predicates themselves.
///
/// Integers and floats are kept apart so that integer data stays integer
/// through copies and aggregation, but they compare equal when they hold the
/// same number.
///
/// # Examples
///
/// ```
/// use jsqn::Value;
///
/// let record = Value::from(serde_json::json!({"name": "Luna", "weight": 10}));
/// assert!(record.is_object());
/// assert_eq!(record.get("weight"), Some(&Value::Integer(10)));
/// // integers and floats holding the same number are equal
/// assert_eq!(Value::Integer(10), Value::Float(10.0));
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// JSON null
    #[default]
    Null,

    /// JSON boolean (true/false)
    Boolean(bool),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    /// Floating-point number
    Float(f64),

    /// UTF-8 string
    String(String),

    /// Array of values
    Array(Vec<Value>),

    /// Object with string keys, in insertion order
    Object(Map),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Integer(a), Float(b)) | (Float(b), Integer(a)) => (*a as f64) == *b,
            (String(a), String(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            // IndexMap equality ignores insertion order
            (Object(a), Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// `Null`, `Boolean`, numbers and strings.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Human-readable name of the value's kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Field of an object; `None` for missing keys and non-objects.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Element of an array. Negative positions count from the end
    /// (-1 = last, -2 = second to last).
    pub fn at(&self, position: i64) -> Option<&Value> {
        match self {
            Value::Array(arr) => {
                let index = if position < 0 {
                    let back = position.unsigned_abs() as usize;
                    if back > arr.len() {
                        return None;
                    }
                    arr.len() - back
                } else {
                    position as usize
                };
                arr.get(index)
            }
            _ => None,
        }
    }

    /// Reads a field or an element depending on the key kind.
    pub fn index(&self, key: &Index) -> Option<&Value> {
        match key {
            Index::Name(name) => self.get(name),
            Index::Position(position) => self.at(*position),
        }
    }
}

/// Orders two values of the same kind: numbers numerically, strings by code
/// point, booleans false-first. Values of different kinds are unordered.
pub fn partial_compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// A source or destination key: an object field name or an array position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Index {
    Name(String),
    Position(i64),
}

impl Index {
    /// Strings that parse entirely as an `i64` become positions, anything
    /// else stays a name.
    pub fn parse(raw: &str) -> Index {
        match raw.parse::<i64>() {
            Ok(position) => Index::Position(position),
            Err(_) => Index::Name(raw.to_string()),
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::Name(name) => write!(f, "{}", name),
            Index::Position(position) => write!(f, "{}", position),
        }
    }
}

impl From<&str> for Index {
    fn from(name: &str) -> Self {
        Index::Name(name.to_string())
    }
}

impl From<i64> for Index {
    fn from(position: i64) -> Self {
        Index::Position(position)
    }
}
