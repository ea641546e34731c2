// crates/aecp-validation/src/operators/normalize.rs
// ============================================================================
// Module: Normalize Operator
// Description: Produces a canonical form of extracted data.
// Purpose: Second stage of a standard validation pipeline.
// Dependencies: crate::operator
// ============================================================================

use aecp_core::FailureCode;
use aecp_core::ValidationResult;
use serde_json::Value;

use crate::operator::Operator;
use crate::operator::OperatorError;
use crate::operator::OperatorValue;

/// Produces a canonical form of a value: strings are trimmed and
/// lowercased, object keys are sorted, and arrays of strings are sorted and
/// deduplicated.
///
/// # Invariants
/// - Idempotence: `normalize(normalize(x)) == normalize(x)` observationally
///   (`spec.md` §4.1, §8 property 2).
///
/// ## Oracle
/// - Output conforms to the declared normalized shape (same JSON variant as
///   input, modulo the transforms above).
#[derive(Debug, Clone, Default)]
pub struct NormalizeOperator;

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_lowercase()),
        Value::Array(items) => {
            let mut normalized: Vec<Value> = items.iter().map(canonicalize).collect();
            normalized.sort_by_key(|v| serde_json::to_string(v).unwrap_or_default());
            normalized.dedup_by_key(|v| serde_json::to_string(v).unwrap_or_default());
            Value::Array(normalized)
        }
        Value::Object(map) => {
            let normalized: serde_json::Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            Value::Object(normalized)
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}

impl Operator for NormalizeOperator {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn validate_invariants(&self, input: &OperatorValue) -> ValidationResult {
        if input.as_value().is_some() {
            ValidationResult::ok("input present")
        } else {
            ValidationResult::fail("normalize requires a value payload", FailureCode::Conflict)
        }
    }

    fn execute(&self, input: &OperatorValue) -> Result<OperatorValue, OperatorError> {
        let value = input.as_value().ok_or_else(|| OperatorError::Failed {
            operator: self.name().to_string(),
            message: "no input value present".to_string(),
        })?;
        Ok(OperatorValue::Normalized {
            value: canonicalize(value),
        })
    }

    fn run_oracle_checks(&self, input: &OperatorValue, output: &OperatorValue) -> Vec<ValidationResult> {
        let Some(original) = input.as_value() else {
            return vec![ValidationResult::fail(
                "normalize oracle has no input to compare against",
                FailureCode::Conflict,
            )];
        };
        let same_shape = std::mem::discriminant(original) == std::mem::discriminant(output.as_value().unwrap_or(&Value::Null));
        if same_shape {
            vec![ValidationResult::ok("normalized shape matches input shape")]
        } else {
            vec![ValidationResult::fail(
                "normalized output changed JSON variant",
                FailureCode::Conflict,
            )]
        }
    }
}

/// Applies [`canonicalize`] twice and checks the results agree, the direct
/// witness for the idempotence invariant.
#[must_use]
pub fn is_idempotent(value: &Value) -> bool {
    let once = canonicalize(value);
    let twice = canonicalize(&once);
    once == twice
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

    use super::NormalizeOperator;
    use super::is_idempotent;
    use crate::operator::Operator;
    use crate::operator::OperatorValue;

    #[test]
    fn normalize_is_idempotent_on_sample_values() {
        let samples = [
            json!("  Mixed Case  "),
            json!(["B", "a", "a"]),
            json!({"Z": 1, "a": "Hi "}),
            json!(null),
        ];
        for sample in samples {
            assert!(is_idempotent(&sample), "not idempotent: {sample:?}");
        }
    }

    #[test]
    fn execute_twice_matches_execute_once() {
        let op = NormalizeOperator;
        let input = OperatorValue::Extracted {
            value: json!(["Beta", "alpha", "alpha"]),
        };
        let once = op.execute(&input).expect("first pass");
        let twice = op.execute(&once).expect("second pass");
        assert_eq!(once.as_value(), twice.as_value());
    }
}
