// crates/aecp-validation/tests/proptest_compare.rs
// ============================================================================
// Module: Compare Operator Property-Based Tests
// Description: Property tests for CompareOperator's reflexivity invariant.
// Purpose: Detect panics and invariant breaks across wide input ranges.
// ============================================================================

//! Property-based tests for the compare operator.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use aecp_validation::operator::Operator;
use aecp_validation::operator::OperatorValue;
use aecp_validation::operators::CompareOperator;
use proptest::prelude::*;
use serde_json::Value;

fn json_value_strategy(max_depth: u32) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|v| Value::Number(v.into())),
        ".*".prop_map(Value::String),
    ];

    leaf.prop_recursive(max_depth, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4).prop_map(|map| {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key, value);
                }
                Value::Object(object)
            }),
        ]
    })
}

proptest! {
    #[test]
    fn compare_is_reflexive(value in json_value_strategy(3)) {
        let operator = CompareOperator;
        let input = OperatorValue::Comparison { expected: value.clone(), actual: value };
        let output = operator.execute(&input).expect("execute");
        let OperatorValue::Compared { matched, diff } = output else {
            panic!("expected a Compared output");
        };
        prop_assert!(matched);
        prop_assert!(diff.is_none());
    }

    #[test]
    fn compare_never_panics_on_random_pairs(expected in json_value_strategy(2), actual in json_value_strategy(2)) {
        let operator = CompareOperator;
        let input = OperatorValue::Comparison { expected: expected.clone(), actual: actual.clone() };
        let output = operator.execute(&input).expect("execute");
        let OperatorValue::Compared { matched, .. } = output else {
            panic!("expected a Compared output");
        };
        prop_assert_eq!(matched, expected == actual);
    }
}
