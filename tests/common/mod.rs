#![allow(dead_code)]

use jsqn::{CompileError, DefaultResolver, Value};

pub fn json(value: serde_json::Value) -> Value {
    Value::from(value)
}

/// The four animals used throughout the tests.
pub fn animals() -> Value {
    json(serde_json::json!([
        {"kind": "dog", "name": "Luna", "is": "feisty", "weight": 10},
        {"kind": "cat", "name": "Ola", "is": "playful", "weight": 5},
        {"kind": "dog", "name": "Bobo", "is": "thoughtful", "weight": 20},
        {"kind": "lion", "name": "King", "is": "thoughtful", "weight": 100},
    ]))
}

/// Compiles `selector` with the default resolver and applies it to `input`.
pub fn select(selector: serde_json::Value, input: &Value) -> Option<Value> {
    DefaultResolver::new()
        .compile(&json(selector))
        .unwrap()
        .apply(input)
}

pub fn compile_err(selector: serde_json::Value) -> CompileError {
    DefaultResolver::new().compile(&json(selector)).unwrap_err()
}

/// Evaluates a predicate against `input`; `None` tests a missing value.
pub fn test(predicate: serde_json::Value, input: Option<serde_json::Value>) -> bool {
    let compiled = DefaultResolver::new().compile_predicate(&json(predicate)).unwrap();
    let input = input.map(json);
    compiled(input.as_ref())
}
