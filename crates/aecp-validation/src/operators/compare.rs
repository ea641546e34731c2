// crates/aecp-validation/src/operators/compare.rs
// ============================================================================
// Module: Compare Operator
// Description: Accepts {expected, actual} and emits {match, diff}.
// Purpose: Third stage of a standard validation pipeline.
// Dependencies: crate::operator
// ============================================================================

use aecp_core::FailureCode;
use aecp_core::ValidationResult;
use serde_json::Value;
use serde_json::json;

use crate::operator::Operator;
use crate::operator::OperatorError;
use crate::operator::OperatorValue;

/// Compares `expected` against `actual` by deep equality and reports a
/// structural diff when they disagree.
///
/// # Invariants
/// - Reflexivity: `compare(x, x).match` is true (`spec.md` §4.1, §8
///   property 3).
///
/// ## Oracle
/// - The reported `match` flag agrees with deep equality of the inputs.
#[derive(Debug, Clone, Default)]
pub struct CompareOperator;

/// Computes a shallow structural diff between two JSON values, sufficient
/// to explain a mismatch without implementing a full patch algebra.
fn diff(expected: &Value, actual: &Value) -> Option<Value> {
    if expected == actual {
        return None;
    }
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => {
            let mut changed = serde_json::Map::new();
            for key in e.keys().chain(a.keys()).collect::<std::collections::BTreeSet<_>>() {
                let ev = e.get(key).cloned().unwrap_or(Value::Null);
                let av = a.get(key).cloned().unwrap_or(Value::Null);
                if ev != av {
                    changed.insert(key.clone(), json!({"expected": ev, "actual": av}));
                }
            }
            Some(Value::Object(changed))
        }
        _ => Some(json!({"expected": expected, "actual": actual})),
    }
}

impl Operator for CompareOperator {
    fn name(&self) -> &'static str {
        "compare"
    }

    fn validate_invariants(&self, input: &OperatorValue) -> ValidationResult {
        match input {
            OperatorValue::Comparison { .. } => ValidationResult::ok("comparison payload present"),
            _ => ValidationResult::fail(
                "compare requires an {expected, actual} payload",
                FailureCode::Conflict,
            ),
        }
    }

    fn execute(&self, input: &OperatorValue) -> Result<OperatorValue, OperatorError> {
        let OperatorValue::Comparison { expected, actual } = input else {
            return Err(OperatorError::Failed {
                operator: self.name().to_string(),
                message: "expected a Comparison payload".to_string(),
            });
        };
        let matched = expected == actual;
        let diff = if matched { None } else { diff(expected, actual) };
        Ok(OperatorValue::Compared { matched, diff })
    }

    fn run_oracle_checks(&self, input: &OperatorValue, output: &OperatorValue) -> Vec<ValidationResult> {
        let (OperatorValue::Comparison { expected, actual }, OperatorValue::Compared { matched, .. }) =
            (input, output)
        else {
            return vec![ValidationResult::fail(
                "compare oracle requires matching input/output shapes",
                FailureCode::Conflict,
            )];
        };
        let deep_equal = expected == actual;
        if *matched == deep_equal {
            vec![ValidationResult::ok("reported match agrees with deep equality")]
        } else {
            vec![ValidationResult::fail(
                "reported match disagrees with deep equality",
                FailureCode::NonDeterminism,
            )]
        }
    }
}

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
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
        reason = "Test-only output and panic-based assertions are permitted."
    )]
    use serde_json::json;

    use super::CompareOperator;
    use crate::operator::Operator;
    use crate::operator::OperatorValue;

    #[test]
    fn reflexive_comparison_matches() {
        let op = CompareOperator;
        let x = json!({"a": 1, "b": [1, 2]});
        let input = OperatorValue::Comparison {
            expected: x.clone(),
            actual: x,
        };
        let output = op.execute(&input).expect("execute");
        let OperatorValue::Compared { matched, diff } = output else {
            panic!("wrong variant");
        };
        assert!(matched);
        assert!(diff.is_none());
    }

    #[test]
    fn mismatch_produces_diff() {
        let op = CompareOperator;
        let input = OperatorValue::Comparison {
            expected: json!({"a": 1}),
            actual: json!({"a": 2}),
        };
        let output = op.execute(&input).expect("execute");
        let OperatorValue::Compared { matched, diff } = output else {
            panic!("wrong variant");
        };
        assert!(!matched);
        assert!(diff.is_some());
    }
}
