mod common;

use common::{animals, json, select};
use jsqn::{DefaultResolver, Value};
use serde_json::json;

fn luna() -> Value {
    json(json!({"kind": "dog", "name": "Luna", "is": "feisty", "weight": 10}))
}

// ========================================================================
// Copying and renaming
// ========================================================================

#[test]
fn test_copy_fields_marked_true_or_empty_accessor() {
    let result = select(json!({"a": true, "c": []}), &json(json!({"a": 5, "b": 6, "c": 7})));
    assert_eq!(result, Some(json(json!({"a": 5, "c": 7}))));
}

#[test]
fn test_rename_with_accessor() {
    let input = json(json!({"a": 5, "b": 6, "c": 7, "d": 8}));
    let result = select(json!({"a": true, "c": [], "b": ["d"]}), &input);
    assert_eq!(result, Some(json(json!({"a": 5, "b": 8, "c": 7}))));
}

#[test]
fn test_output_keeps_selector_order() {
    let input = json(json!({"a": 5, "b": 6, "c": 7}));
    let result = select(json!({"c": true, "a": true}), &input).unwrap();
    assert_eq!(result.to_string(), r#"{"c":7,"a":5}"#);
}

#[test]
fn test_empty_selector_copies_objects() {
    let input = json(json!({"a": 1, "b": [2, 3]}));
    assert_eq!(select(json!({}), &input), Some(input.clone()));
}

#[test]
fn test_empty_selector_on_terminal_is_empty_object() {
    assert_eq!(select(json!({}), &Value::Integer(5)), Some(json(json!({}))));
}

#[test]
fn test_record_with_missing_field_is_dropped() {
    let input = json(json!([{"name": "a", "nick": "b"}, {"name": "c"}]));
    let result = select(json!({"name": true, "nick": true}), &input);
    assert_eq!(result, Some(json(json!([{"name": "a", "nick": "b"}]))));
}

#[test]
fn test_mismatched_key_types_are_ignored() {
    let input = json(json!({"a": 1, "b": 2}));
    let result = select(json!({"a": true, "0": ["b"]}), &input);
    assert_eq!(result, Some(json(json!({"a": 1}))));
}

#[test]
fn test_second_write_to_destination_is_ignored() {
    // "1" and "01" both resolve to position 1
    let input = json(json!({"a": 5, "b": 6}));
    let result = select(json!({"1": ["a"], "01": ["b"]}), &input);
    assert_eq!(result, Some(json(json!([null, 5]))));
}

// ========================================================================
// Arrays as source or destination
// ========================================================================

#[test]
fn test_object_to_tuple() {
    let result = select(json!({"0": ["a"], "2": ["b"]}), &json(json!({"a": 5, "b": 6, "c": 7})));
    assert_eq!(result, Some(json(json!([5, null, 6]))));
}

#[test]
fn test_ordering_slots_follow_key_order_without_padding() {
    let input = json(json!({"a": 5, "b": 6, "c": 7}));
    assert_eq!(select(json!({"-1": ["a"], "-2": ["b"]}), &input), Some(json(json!([6, 5]))));
    assert_eq!(select(json!({"-1": ["a"], "-2": ["missing"]}), &input), Some(json(json!([5]))));
}

#[test]
fn test_tuple_slots_come_before_ordering_slots() {
    let input = json(json!({"a": 5, "b": 6}));
    let result = select(json!({"-1": ["a"], "0": ["b"]}), &input);
    assert_eq!(result, Some(json(json!([6, 5]))));
}

#[test]
fn test_array_to_object() {
    let result = select(json!({"a": [0], "b": [-1]}), &json(json!([5, 6, 7])));
    assert_eq!(result, Some(json(json!({"a": 5, "b": 7}))));
}

#[test]
fn test_array_to_array() {
    let result = select(json!({"0": [2], "1": [0]}), &json(json!([5, 6, 7])));
    assert_eq!(result, Some(json(json!([7, 5]))));
}

#[test]
fn test_first_element_of_records() {
    let result = select(json!({"0": {"name": true, "kind": []}}), &animals());
    assert_eq!(result, Some(json(json!([{"name": "Luna", "kind": "dog"}]))));

    let result = select(json!({"0": {"first_name": ["name"]}}), &animals());
    assert_eq!(result, Some(json(json!([{"first_name": "Luna"}]))));
}

// ========================================================================
// Select-all
// ========================================================================

#[test]
fn test_select_all_with_exclusions() {
    let result = select(json!({"0": {"*": true, "is": false, "weight": false}}), &animals());
    assert_eq!(result, Some(json(json!([{"name": "Luna", "kind": "dog"}]))));
}

#[test]
fn test_select_all_skips_fields_already_read() {
    let result = select(json!({"*": true, "name": ["kind"]}), &luna());
    assert_eq!(result, Some(json(json!({"name": "dog", "is": "feisty", "weight": 10}))));
}

#[test]
fn test_exclusion_without_select_all_copies_the_rest() {
    let result = select(json!({"is": false, "weight": false}), &luna());
    assert_eq!(result, Some(json(json!({"kind": "dog", "name": "Luna"}))));
}

#[test]
fn test_select_all_false_drops_everything_else() {
    assert_eq!(select(json!({"*": false}), &luna()), Some(json(json!({}))));
}

#[test]
fn test_select_all_applies_its_selector() {
    let input = json(json!({"a": "x", "b": "y"}));
    let result = select(json!({"*": ["uppercase", []]}), &input);
    assert_eq!(result, Some(json(json!({"a": "X", "b": "Y"}))));
}

#[test]
fn test_array_select_all_skips_excluded_positions() {
    let result = select(json!({"1": false, "*": true}), &json(json!(["a", "b", "c"])));
    assert_eq!(result, Some(json(json!(["a", "c"]))));
}

#[test]
fn test_array_select_all_appends_past_the_tuple() {
    let result = select(json!({"0": [2], "*": true}), &json(json!([5, 6, 7, 8])));
    assert_eq!(result, Some(json(json!([7, 6, 8]))));
}

#[test]
fn test_array_select_all_fills_holes_in_place() {
    // "c" would land on position 2, which is already written
    let result = select(json!({"0": [3], "2": [0], "*": true}), &json(json!(["a", "b", "c", "d"])));
    assert_eq!(result, Some(json(json!(["d", "b", "a"]))));
}

#[test]
fn test_array_select_all_skips_positions_read_from_the_end() {
    let result = select(json!({"0": [-1], "*": true}), &json(json!(["a", "b", "c"])));
    assert_eq!(result, Some(json(json!(["c", "b"]))));

    let result = select(json!({"0": [-5], "*": true}), &json(json!(["a", "b"])));
    assert_eq!(result, Some(json(json!([null, "b"]))));
}

// ========================================================================
// Distribution and broadcast
// ========================================================================

#[test]
fn test_object_selector_distributes_over_arrays() {
    let result = select(json!({"name": []}), &animals());
    assert_eq!(
        result,
        Some(json(json!([{"name": "Luna"}, {"name": "Ola"}, {"name": "Bobo"}, {"name": "King"}])))
    );
}

#[test]
fn test_distribution_recurses_into_nested_arrays() {
    let input = json(json!([{"a": 1}, [{"a": 2}, {"a": 3}]]));
    let result = select(json!({"a": true}), &input);
    assert_eq!(result, Some(json(json!([{"a": 1}, [{"a": 2}, {"a": 3}]]))));
}

#[test]
fn test_terminal_broadcasts_into_every_field() {
    let result = select(json!({"a": true, "b": ["uppercase", []]}), &json(json!("x")));
    assert_eq!(result, Some(json(json!({"a": "x", "b": "X"}))));

    let result = select(json!({"0": true, "1": true}), &Value::Integer(7));
    assert_eq!(result, Some(json(json!([7, 7]))));
}

#[test]
fn test_broadcast_over_array_of_terminals() {
    let result = select(json!({"v": true}), &json(json!([1, 2])));
    assert_eq!(result, Some(json(json!([{"v": 1}, {"v": 2}]))));
}

// ========================================================================
// Constants and chains
// ========================================================================

#[test]
fn test_constant_ignores_input() {
    let result = select(json!({"tag": [["pet"]]}), &luna());
    assert_eq!(result, Some(json(json!({"tag": "pet"}))));
}

#[test]
fn test_chain_feeds_head_into_tail() {
    let result = select(json!({"Luna is": [[0], ["is"]]}), &animals());
    assert_eq!(result, Some(json(json!({"Luna is": "feisty"}))));
}

#[test]
fn test_chain_into_constant() {
    let result = select(
        json!({"static": [[1], [["This can be anything, including a static array"]]]}),
        &animals(),
    );
    assert_eq!(
        result,
        Some(json(json!({"static": "This can be anything, including a static array"})))
    );
}

#[test]
fn test_chain_into_function() {
    let result = select(json!({"First Dog is": [[0], "uppercase", ["name"]]}), &animals());
    assert_eq!(result, Some(json(json!({"First Dog is": "LUNA"}))));
}

#[test]
fn test_chain_broadcasts_over_selected_array() {
    let input = json(json!({"pets": [{"name": "a"}, {"name": "b"}]}));
    let result = select(json!({"pets": [[], ["name"]]}), &input);
    assert_eq!(result, Some(json(json!({"pets": ["a", "b"]}))));
}

#[test]
fn test_nested_selector_in_pipeline() {
    let input = json(json!({"owner": {"first": "Ann", "age": 40}}));
    let result = select(json!({"owner": [{"first": true}]}), &input);
    assert_eq!(result, Some(json(json!({"owner": {"first": "Ann"}}))));
}

// ========================================================================
// Function calls
// ========================================================================

#[test]
fn test_function_reads_named_field() {
    let result = select(json!({"loud": ["uppercase", ["name"]]}), &luna());
    assert_eq!(result, Some(json(json!({"loud": "LUNA"}))));
}

#[test]
fn test_bare_function_name_applies_to_same_field() {
    let result = select(json!({"name": "uppercase"}), &luna());
    assert_eq!(result, Some(json(json!({"name": "LUNA"}))));
}

#[test]
fn test_function_with_constant_arguments() {
    let result = select(json!({"label": ["concat", ["name"], " is a ", [["pet"]]]}), &luna());
    assert_eq!(result, Some(json(json!({"label": "Luna is a pet"}))));

    let result = select(json!({"weight": ["round", [], 1]}), &json(json!({"weight": 2.25})));
    assert_eq!(result, Some(json(json!({"weight": 2.3}))));
}

#[test]
fn test_function_read_in_later_slot() {
    let input = json(json!({"nick": null}));
    let result = select(json!({"nick": ["default", ["nick"], "none"]}), &input);
    assert_eq!(result, Some(json(json!({"nick": "none"}))));
}

#[test]
fn test_absent_read_skips_the_call() {
    assert_eq!(select(json!({"loud": ["uppercase", ["nick"]]}), &luna()), None);
}

// ========================================================================
// Filtering
// ========================================================================

#[test]
fn test_filter_drops_non_matching_records() {
    let result = select(json!({"name": true, "?": {"kind": "cat"}}), &animals());
    assert_eq!(result, Some(json(json!([{"name": "Ola"}]))));
}

#[test]
fn test_filter_and() {
    let result = select(json!({"name": true, "?": {"kind": "dog", "name": "Bobo"}}), &animals());
    assert_eq!(result, Some(json(json!([{"name": "Bobo"}]))));
}

#[test]
fn test_filter_or_keeps_input_order() {
    let selector = json!({"name": true, "?": [{"kind": "lion"}, {"name": "Ola"}]});
    let result = select(selector, &animals());
    assert_eq!(result, Some(json(json!([{"name": "Ola"}, {"name": "King"}]))));
}

#[test]
fn test_filter_inside_a_field() {
    let result = select(json!({"name": true, "kind": {"?": {"~": ".*at"}}}), &animals());
    assert_eq!(result, Some(json(json!([{"name": "Ola", "kind": "cat"}]))));
}

#[test]
fn test_filter_only_selector_keeps_whole_records() {
    let result = select(json!({"?": {"weight": {">": 50}}}), &animals());
    assert_eq!(
        result,
        Some(json(json!([{"kind": "lion", "name": "King", "is": "thoughtful", "weight": 100}])))
    );
}

#[test]
fn test_filter_on_single_record() {
    assert_eq!(select(json!({"name": true, "?": {"kind": "cat"}}), &luna()), None);
}

// ========================================================================
// Top-level selectors
// ========================================================================

#[test]
fn test_top_level_pipeline() {
    assert_eq!(select(json!(["name"]), &luna()), Some(json(json!("Luna"))));
    assert_eq!(select(json!([[0], ["name"]]), &animals()), Some(json(json!("Luna"))));
    assert_eq!(select(json!(["uppercase", ["is"]]), &luna()), Some(json(json!("FEISTY"))));
}

#[test]
fn test_top_level_copy_and_exclude() {
    assert_eq!(select(json!(true), &luna()), Some(luna()));
    assert_eq!(select(json!(false), &luna()), None);
}

#[test]
fn test_compiled_selector_is_idempotent() {
    let selector = DefaultResolver::new()
        .compile(&json(json!({"kind": true, "weight": "sum"})))
        .unwrap();
    let first = selector.apply(&animals());
    let second = selector.apply(&animals());
    assert_eq!(first, second);
}
