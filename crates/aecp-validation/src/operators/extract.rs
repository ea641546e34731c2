// crates/aecp-validation/src/operators/extract.rs
// ============================================================================
// Module: Extract Operator
// Description: Projects fields from raw tool output.
// Purpose: First stage of a standard validation pipeline.
// Dependencies: crate::operator
// ============================================================================

use aecp_core::FailureCode;
use aecp_core::ValidationResult;
use serde_json::Value;

use crate::operator::Operator;
use crate::operator::OperatorError;
use crate::operator::OperatorValue;

/// Projects a single field path (dot-separated) out of a raw tool output.
///
/// # Invariants
/// - Input must be non-null (`spec.md` §4.1 "Invariant: input non-null").
///
/// ## Oracle
/// - The extracted value must be non-empty (non-null, non-empty
///   string/array/object).
#[derive(Debug, Clone)]
pub struct ExtractOperator {
    /// Dot-separated path into the raw value, e.g. `"result.files"`.
    pub field_path: String,
}

impl ExtractOperator {
    /// Creates a new extract operator for the given field path.
    #[must_use]
    pub fn new(field_path: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
        }
    }

    fn project<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.field_path
            .split('.')
            .try_fold(value, |current, segment| current.get(segment))
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

impl Operator for ExtractOperator {
    fn name(&self) -> &'static str {
        "extract"
    }

    fn validate_invariants(&self, input: &OperatorValue) -> ValidationResult {
        match input.as_value() {
            Some(value) if !value.is_null() => ValidationResult::ok("input is non-null"),
            _ => ValidationResult::fail("extract requires non-null input", FailureCode::MissingData),
        }
    }

    fn execute(&self, input: &OperatorValue) -> Result<OperatorValue, OperatorError> {
        let raw = input.as_value().ok_or_else(|| OperatorError::Failed {
            operator: self.name().to_string(),
            message: "no input value present".to_string(),
        })?;
        let projected = self.project(raw).cloned().unwrap_or(Value::Null);
        Ok(OperatorValue::Extracted { value: projected })
    }

    fn run_oracle_checks(&self, _input: &OperatorValue, output: &OperatorValue) -> Vec<ValidationResult> {
        let value = output.as_value().cloned().unwrap_or(Value::Null);
        if is_empty(&value) {
            vec![ValidationResult::fail(
                format!("extracted field '{}' was empty", self.field_path),
                FailureCode::MissingData,
            )]
        } else {
            vec![ValidationResult::ok("extracted value is non-empty")]
        }
    }
}
