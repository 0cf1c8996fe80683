//! JSON text rendering for jsqn values.
//!
//! Used for `Display`, for quoting selector fragments in compile errors and
//! for building structural group keys. Object keys are written in insertion
//! order, so output mirrors the shape the selector produced. The canonical
//! form sorts object keys and writes integral floats as integers, so values
//! that compare equal render the same.
//!
//! # Examples
//!
//! ```
//! use jsqn::Value;
//! use jsqn::output::{to_json, to_json_pretty};
//!
//! let value = Value::from(serde_json::json!({"kind": "cat", "names": ["Ola"]}));
//!
//! assert_eq!(to_json(&value), r#"{"kind":"cat","names":["Ola"]}"#);
//! assert_eq!(to_json_pretty(&Value::Integer(42)), "42");
//! ```

use std::fmt;

use crate::value::{Map, Value};

pub struct JsonPrinter {
    pretty: bool,
    canonical: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter {
            pretty,
            canonical: false,
        }
    }

    /// Compact printer with sorted object keys.
    pub fn canonical() -> Self {
        JsonPrinter {
            pretty: false,
            canonical: true,
        }
    }

    pub fn print(&self, value: &Value) -> String {
        let mut out = String::new();
        self.print_value(value, 0, &mut out);
        out
    }

    fn print_value(&self, value: &Value, indent: usize, out: &mut String) {
        match value {
            Value::Null => out.push_str("null"),
            Value::Boolean(b) => out.push_str(&b.to_string()),
            Value::Integer(n) => out.push_str(&n.to_string()),
            Value::Float(n) if self.canonical && n.fract() == 0.0 && n.abs() < 9.0e15 => {
                out.push_str(&(*n as i64).to_string())
            }
            Value::Float(n) if n.is_finite() => out.push_str(&n.to_string()),
            Value::Float(_) => out.push_str("null"),
            Value::String(s) => self.print_string(s, out),
            Value::Array(arr) => self.print_array(arr, indent, out),
            Value::Object(obj) => self.print_object(obj, indent, out),
        }
    }

    fn print_array(&self, arr: &[Value], indent: usize, out: &mut String) {
        if arr.is_empty() {
            out.push_str("[]");
            return;
        }

        out.push('[');
        for (i, item) in arr.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.newline(indent + 1, out);
            self.print_value(item, indent + 1, out);
        }
        self.newline(indent, out);
        out.push(']');
    }

    fn print_object(&self, obj: &Map, indent: usize, out: &mut String) {
        if obj.is_empty() {
            out.push_str("{}");
            return;
        }

        let mut entries: Vec<(&String, &Value)> = obj.iter().collect();
        if self.canonical {
            entries.sort_by(|a, b| a.0.cmp(b.0));
        }

        out.push('{');
        for (i, (key, item)) in entries.into_iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.newline(indent + 1, out);
            self.print_string(key, out);
            out.push(':');
            if self.pretty {
                out.push(' ');
            }
            self.print_value(item, indent + 1, out);
        }
        self.newline(indent, out);
        out.push('}');
    }

    fn newline(&self, level: usize, out: &mut String) {
        if self.pretty {
            out.push('\n');
            out.push_str(&"  ".repeat(level));
        }
    }

    fn print_string(&self, s: &str, out: &mut String) {
        out.push('"');
        for c in s.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                // Unicode escape for control chars
                c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
                c => out.push(c),
            }
        }
        out.push('"');
    }
}

/// Converts a Value to compact JSON text.
pub fn to_json(value: &Value) -> String {
    JsonPrinter::new(false).print(value)
}

/// Converts a Value to compact JSON text with object keys in sorted order.
///
/// ```
/// use jsqn::Value;
/// use jsqn::output::to_canonical_json;
///
/// let a = Value::from(serde_json::json!({"b": 2.0, "a": 1}));
/// let b = Value::from(serde_json::json!({"a": 1, "b": 2}));
/// assert_eq!(to_canonical_json(&a), to_canonical_json(&b));
/// ```
pub fn to_canonical_json(value: &Value) -> String {
    JsonPrinter::canonical().print(value)
}

/// Converts a Value to JSON text with 2-space indentation, one element or
/// property per line.
pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).print(value)
}

impl fmt::Display for Value {
    /// `{}` renders compact JSON, `{:#}` renders pretty JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str(&to_json_pretty(self))
        } else {
            f.write_str(&to_json(self))
        }
    }
}
