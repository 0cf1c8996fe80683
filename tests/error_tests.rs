mod common;

use std::error::Error;

use common::{compile_err, json, select};
use jsqn::{CompileError, DefaultResolver, Value, compile_predicate};
use serde_json::json;

fn root(error: &CompileError) -> &CompileError {
    error.root_cause()
}

// ========================================================================
// Names
// ========================================================================

#[test]
fn test_unknown_bare_name() {
    let error = compile_err(json!({"a": "nope"}));
    assert_eq!(root(&error), &CompileError::UnknownName("nope".into()));
    assert_eq!(error.to_string(), "at .a: Unknown aggregator or function: nope");
}

#[test]
fn test_unknown_function() {
    let error = compile_err(json!({"a": ["nope", ["x"]]}));
    assert_eq!(root(&error), &CompileError::UnknownFunction("nope".into()));
}

#[test]
fn test_error_path_follows_nesting() {
    let error = compile_err(json!({"a": {"b": "nope"}}));
    match &error {
        CompileError::Located { path, .. } => {
            assert_eq!(path, &vec!["a".to_string(), "b".to_string()])
        }
        other => panic!("expected a located error, got {:?}", other),
    }
    assert!(error.to_string().starts_with("at .a.b: "));
    assert!(error.source().is_some());
}

// ========================================================================
// Selector shapes
// ========================================================================

#[test]
fn test_huge_destination_position_is_rejected() {
    let error = compile_err(json!({"9223372036854775807": ["a"]}));
    match &error {
        CompileError::Located { path, source } => {
            assert_eq!(path, &vec!["9223372036854775807".to_string()]);
            assert!(matches!(**source, CompileError::InvalidSelector { .. }));
        }
        other => panic!("expected a located error, got {:?}", other),
    }

    let error = compile_err(json!({"0": true, "65536": ["b"]}));
    assert!(matches!(root(&error), CompileError::InvalidSelector { .. }));
}

#[test]
fn test_largest_destination_position_compiles() {
    let result = select(json!({"65535": ["a"]}), &json(json!({"a": 1})));
    let Some(Value::Array(slots)) = result else {
        panic!("expected a tuple");
    };
    assert_eq!(slots.len(), 65536);
    assert_eq!(slots[65535], Value::Integer(1));
}

#[test]
fn test_zero_sort_priority() {
    let error = compile_err(json!({"a": 0}));
    assert!(matches!(root(&error), CompileError::InvalidSelector { .. }));
}

#[test]
fn test_fractional_sort_priority() {
    let error = compile_err(json!({"a": 1.5}));
    assert!(matches!(root(&error), CompileError::InvalidSelector { .. }));
}

#[test]
fn test_invalid_accessor() {
    let error = compile_err(json!({"a": [true]}));
    match root(&error) {
        CompileError::InvalidSelector { fragment, .. } => assert_eq!(fragment, "true"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_constant_needs_exactly_one_value() {
    let error = compile_err(json!({"a": [[1, 2]]}));
    assert!(matches!(root(&error), CompileError::InvalidSelector { .. }));
}

// ========================================================================
// Function arguments
// ========================================================================

#[test]
fn test_two_reads_are_unsupported() {
    let error = compile_err(json!({"label": ["concat", ["name"], ["kind"]]}));
    assert!(matches!(
        root(&error),
        CompileError::UnsupportedArguments { function, .. } if function == "concat"
    ));
}

#[test]
fn test_no_read_is_unsupported() {
    let error = compile_err(json!({"label": ["concat", "a", "b"]}));
    assert!(matches!(root(&error), CompileError::UnsupportedArguments { .. }));
}

// ========================================================================
// Directives
// ========================================================================

#[test]
fn test_top_level_aggregation_is_misplaced() {
    let error = compile_err(json!("sum"));
    assert!(matches!(error, CompileError::MisplacedDirective { .. }));
}

#[test]
fn test_top_level_sort_is_misplaced() {
    let error = compile_err(json!(3));
    assert!(matches!(error, CompileError::MisplacedDirective { .. }));
}

#[test]
fn test_select_all_aggregation_is_misplaced() {
    let error = compile_err(json!({"*": "sum"}));
    match &error {
        CompileError::Located { path, source } => {
            assert_eq!(path, &vec!["*".to_string()]);
            assert!(matches!(**source, CompileError::MisplacedDirective { .. }));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_select_all_single_key_is_invalid() {
    let error = compile_err(json!({"*": ["name"]}));
    assert!(matches!(root(&error), CompileError::InvalidSelector { .. }));
}

#[test]
fn test_nested_aggregation_is_misplaced() {
    let error = compile_err(json!({"a": ["sum", "values", ["x"]]}));
    assert!(matches!(root(&error), CompileError::MisplacedDirective { .. }));
}

#[test]
fn test_chain_cannot_start_with_exclusion() {
    let error = compile_err(json!({"a": [false, ["x"]]}));
    assert!(matches!(root(&error), CompileError::MisplacedDirective { .. }));
}

// ========================================================================
// Predicates
// ========================================================================

#[test]
fn test_nested_disjunction() {
    let error = compile_err(json!({"a": true, "?": [[1]]}));
    assert!(matches!(root(&error), CompileError::NestedDisjunction { .. }));

    let Err(error) = compile_predicate(&json(json!([1, [2]])), &DefaultResolver::new()) else {
        panic!("a list inside a list should not compile");
    };
    assert!(matches!(error, CompileError::NestedDisjunction { .. }));
}

#[test]
fn test_comparison_operand_must_be_literal() {
    let error = compile_err(json!({"a": true, "?": {"a": {"<": {"b": 1}}}}));
    assert!(matches!(
        root(&error),
        CompileError::InvalidOperand { operator, .. } if operator == "<"
    ));
    match &error {
        CompileError::Located { path, .. } => {
            assert_eq!(path, &vec!["?".to_string(), "a".to_string(), "<".to_string()])
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_regex_pattern_must_be_string() {
    let error = compile_err(json!({"?": {"~": 5}}));
    assert!(matches!(root(&error), CompileError::InvalidOperand { .. }));
}

#[test]
fn test_invalid_regex() {
    let error = compile_err(json!({"?": {"~": "("}}));
    assert!(matches!(
        root(&error),
        CompileError::InvalidRegex { pattern, .. } if pattern == "("
    ));
}
