//! Transform functions registered by [`crate::DefaultResolver::new`].
//!
//! Functions are total: arguments of the wrong type produce `null` instead
//! of failing, since evaluation never reports errors.

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{output::to_json, resolver::TransformFn, value::Value};

fn arg(args: &[Value], i: usize) -> &Value {
    args.get(i).unwrap_or(&Value::Null)
}

/// abs(number)
fn abs(args: &[Value]) -> Value {
    match arg(args, 0) {
        Value::Integer(n) => n
            .checked_abs()
            .map(Value::Integer)
            .unwrap_or(Value::Float((*n as f64).abs())),
        Value::Float(n) => Value::Float(n.abs()),
        _ => Value::Null,
    }
}

fn map_string(args: &[Value], f: impl Fn(&str) -> String) -> Value {
    match arg(args, 0) {
        Value::String(s) => Value::String(f(s)),
        _ => Value::Null,
    }
}

/// uppercase(string)
fn uppercase(args: &[Value]) -> Value {
    map_string(args, str::to_uppercase)
}

/// lowercase(string)
fn lowercase(args: &[Value]) -> Value {
    map_string(args, str::to_lowercase)
}

/// trim(string)
fn trim(args: &[Value]) -> Value {
    map_string(args, |s| s.trim().to_string())
}

/// length(string | array | object)
fn length(args: &[Value]) -> Value {
    match arg(args, 0) {
        Value::String(s) => Value::Integer(s.chars().count() as i64),
        Value::Array(arr) => Value::Integer(arr.len() as i64),
        Value::Object(obj) => Value::Integer(obj.len() as i64),
        _ => Value::Null,
    }
}

/// Float results that are whole numbers come back as integers.
fn whole(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Integer(n as i64)
    } else {
        Value::Float(n)
    }
}

/// round(number, digits?) - half away from zero
fn round(args: &[Value]) -> Value {
    let digits = match arg(args, 1) {
        Value::Integer(d) if *d >= 0 => *d as u32,
        Value::Null => 0,
        _ => return Value::Null,
    };
    match arg(args, 0) {
        Value::Integer(n) => Value::Integer(*n),
        Value::Float(n) => {
            let rounded = Decimal::from_f64(*n)
                .map(|d| d.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero))
                .and_then(|d| d.to_f64());
            match rounded {
                Some(r) if digits == 0 => whole(r),
                Some(r) => Value::Float(r),
                None => Value::Float(*n),
            }
        }
        _ => Value::Null,
    }
}

/// floor(number)
fn floor(args: &[Value]) -> Value {
    match arg(args, 0) {
        Value::Integer(n) => Value::Integer(*n),
        Value::Float(n) => whole(n.floor()),
        _ => Value::Null,
    }
}

/// ceil(number)
fn ceil(args: &[Value]) -> Value {
    match arg(args, 0) {
        Value::Integer(n) => Value::Integer(*n),
        Value::Float(n) => whole(n.ceil()),
        _ => Value::Null,
    }
}

/// concat(value, ...) - strings as-is, other values as JSON text
fn concat(args: &[Value]) -> Value {
    let mut out = String::new();
    for value in args {
        match value {
            Value::String(s) => out.push_str(s),
            other => out.push_str(&to_json(other)),
        }
    }
    Value::String(out)
}

/// default(value, fallback) - fallback when value is null
fn default(args: &[Value]) -> Value {
    match arg(args, 0) {
        Value::Null => arg(args, 1).clone(),
        value => value.clone(),
    }
}

/// The functions registered by [`crate::DefaultResolver::new`].
pub fn builtin_functions() -> Vec<(&'static str, TransformFn)> {
    fn wrap(f: fn(&[Value]) -> Value) -> TransformFn {
        Arc::new(f)
    }

    vec![
        ("abs", wrap(abs)),
        ("uppercase", wrap(uppercase)),
        ("lowercase", wrap(lowercase)),
        ("trim", wrap(trim)),
        ("length", wrap(length)),
        ("round", wrap(round)),
        ("floor", wrap(floor)),
        ("ceil", wrap(ceil)),
        ("concat", wrap(concat)),
        ("default", wrap(default)),
    ]
}
