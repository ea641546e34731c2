// crates/aecp-validation/src/operators/schema.rs
// ============================================================================
// Module: Verify Schema Operator
// Description: Declarative check against a subset of JSON-Schema.
// Purpose: Fourth stage of a standard validation pipeline.
// Dependencies: crate::operator
// ============================================================================

//! ## Overview
//! Validates a value against a full JSON Schema document using the
//! `jsonschema` crate's draft 2020-12 validator (`spec.md` §4.1), the same
//! crate the teacher workspace's `decision-gate-mcp` compiles and validates
//! schemas with (`validation.rs`, `tools.rs`). A cheap top-level
//! required-field pre-check runs ahead of the compiled validator so the
//! plane can still distinguish "the field is missing" (`MissingData`) from
//! "the field is the wrong shape" (`Conflict`) the way `spec.md` §4.1
//! expects, without needing the crate's internal error-kind taxonomy.

use aecp_core::FailureCode;
use aecp_core::ValidationResult;
use jsonschema::Draft;
use serde_json::Value;

use crate::operator::Operator;
use crate::operator::OperatorError;
use crate::operator::OperatorValue;

/// Verifies a value against a JSON Schema document.
#[derive(Debug, Clone)]
pub struct VerifySchemaOperator {
    /// The schema document.
    pub schema: Value,
}

impl VerifySchemaOperator {
    /// Creates a new schema operator for the given schema document.
    #[must_use]
    pub const fn new(schema: Value) -> Self {
        Self { schema }
    }
}

/// Returns the name of the first top-level required field missing from
/// `value`, if any.
fn missing_required_field(schema: &Value, value: &Value) -> Option<String> {
    let required = schema.as_object()?.get("required")?.as_array()?;
    required
        .iter()
        .filter_map(Value::as_str)
        .find(|field| value.get(field).is_none())
        .map(ToString::to_string)
}

/// Checks `value` against `schema`, returning the first violation
/// encountered, or `None` if the value conforms.
fn check(schema: &Value, value: &Value) -> Option<ValidationResult> {
    if let Some(field) = missing_required_field(schema, value) {
        return Some(ValidationResult::fail(
            format!("missing required field '{field}'"),
            FailureCode::MissingData,
        ));
    }

    let validator = match jsonschema::options().with_draft(Draft::Draft202012).build(schema) {
        Ok(validator) => validator,
        Err(err) => {
            return Some(ValidationResult::fail(format!("invalid schema: {err}"), FailureCode::Conflict));
        }
    };

    let messages: Vec<String> = validator.iter_errors(value).map(|err| err.to_string()).collect();
    if messages.is_empty() {
        None
    } else {
        Some(ValidationResult::fail(messages.join("; "), FailureCode::Conflict))
    }
}

impl Operator for VerifySchemaOperator {
    fn name(&self) -> &'static str {
        "verify_schema"
    }

    fn validate_invariants(&self, _input: &OperatorValue) -> ValidationResult {
        if self.schema.is_object() {
            ValidationResult::ok("schema is an object")
        } else {
            ValidationResult::fail("schema document must be a JSON object", FailureCode::Conflict)
        }
    }

    fn execute(&self, input: &OperatorValue) -> Result<OperatorValue, OperatorError> {
        let value = input.as_value().cloned().unwrap_or(Value::Null);
        let result = check(&self.schema, &value).unwrap_or_else(|| ValidationResult::ok("schema satisfied"));
        Ok(OperatorValue::Attributes {
            attributes: [(
                "validation_result".to_string(),
                serde_json::to_value(&result).unwrap_or(Value::Null),
            )]
            .into_iter()
            .collect(),
        })
    }

    fn run_oracle_checks(&self, _input: &OperatorValue, _output: &OperatorValue) -> Vec<ValidationResult> {
        Vec::new()
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
    use serde_json::Value;
    use serde_json::json;

    use super::VerifySchemaOperator;
    use crate::operator::Operator;
    use crate::operator::OperatorValue;

    fn result_of(output: &OperatorValue) -> aecp_core::ValidationResult {
        let OperatorValue::Attributes { attributes } = output else {
            panic!("wrong variant");
        };
        serde_json::from_value(attributes["validation_result"].clone()).expect("decode")
    }

    #[test]
    fn missing_required_field_is_missing_data() {
        let op = VerifySchemaOperator::new(json!({
            "type": "object",
            "required": ["name"],
            "properties": {"name": {"type": "string"}}
        }));
        let input = OperatorValue::Extracted { value: json!({}) };
        let output = op.execute(&input).expect("execute");
        let result = result_of(&output);
        assert!(!result.valid);
        assert_eq!(result.failure_code, Some(aecp_core::FailureCode::MissingData));
    }

    #[test]
    fn type_mismatch_is_conflict() {
        let op = VerifySchemaOperator::new(json!({
            "type": "object",
            "properties": {"count": {"type": "integer"}}
        }));
        let input = OperatorValue::Extracted {
            value: json!({"count": "not-a-number"}),
        };
        let output = op.execute(&input).expect("execute");
        let result = result_of(&output);
        assert!(!result.valid);
        assert_eq!(result.failure_code, Some(aecp_core::FailureCode::Conflict));
    }

    #[test]
    fn nested_object_recurses() {
        let op = VerifySchemaOperator::new(json!({
            "type": "object",
            "properties": {
                "user": {
                    "type": "object",
                    "required": ["id"]
                }
            }
        }));
        let input = OperatorValue::Extracted {
            value: json!({"user": {}}),
        };
        let output = op.execute(&input).expect("execute");
        let result = result_of(&output);
        assert!(!result.valid);
    }

    #[test]
    fn null_against_a_not_null_type_is_conflict() {
        let op = VerifySchemaOperator::new(json!({"type": "object"}));
        let input = OperatorValue::Extracted { value: Value::Null };
        let output = op.execute(&input).expect("execute");
        let result = result_of(&output);
        assert!(!result.valid);
        assert_eq!(result.failure_code, Some(aecp_core::FailureCode::Conflict));
    }

    #[test]
    fn conforming_value_passes() {
        let op = VerifySchemaOperator::new(json!({
            "type": "object",
            "required": ["name"],
            "properties": {"name": {"type": "string"}}
        }));
        let input = OperatorValue::Extracted {
            value: json!({"name": "ok"}),
        };
        let output = op.execute(&input).expect("execute");
        assert!(result_of(&output).valid);
    }
}
