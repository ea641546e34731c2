// crates/aecp-validation/src/operators/constraints.rs
// ============================================================================
// Module: Verify Constraints Operator
// Description: Evaluates a list of named predicates in order.
// Purpose: Fifth stage of a standard validation pipeline.
// Dependencies: crate::operator
// ============================================================================

use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;

use aecp_core::FailureCode;
use aecp_core::ValidationResult;

use crate::operator::Operator;
use crate::operator::OperatorError;
use crate::operator::OperatorValue;

/// A single named predicate evaluated against a value.
pub struct NamedConstraint {
    /// Constraint name, surfaced in the failure reason.
    pub name: String,
    /// The predicate itself. A predicate that panics is treated as a
    /// thrown exception and yields [`FailureCode::ToolError`] (`spec.md`
    /// §4.1: "a thrown predicate yields `tool_error`").
    pub predicate: Box<dyn Fn(&serde_json::Value) -> bool + Send + Sync>,
}

impl NamedConstraint {
    /// Creates a new named constraint from a predicate closure.
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&serde_json::Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }
}

/// Evaluates a list of named predicates against a value in order, stopping
/// at the first violation.
///
/// ## Edge cases
/// - An empty constraint list always passes (`spec.md` §4.1: "empty list
///   passes").
#[derive(Default)]
pub struct VerifyConstraintsOperator {
    /// Constraints evaluated in declaration order.
    pub constraints: Vec<NamedConstraint>,
}

impl VerifyConstraintsOperator {
    /// Creates an operator over the given constraint list.
    #[must_use]
    pub fn new(constraints: Vec<NamedConstraint>) -> Self {
        Self { constraints }
    }
}

impl Operator for VerifyConstraintsOperator {
    fn name(&self) -> &'static str {
        "verify_constraints"
    }

    fn validate_invariants(&self, input: &OperatorValue) -> ValidationResult {
        if input.as_value().is_some() || self.constraints.is_empty() {
            ValidationResult::ok("input present for constraint evaluation")
        } else {
            ValidationResult::fail(
                "verify_constraints requires a value payload when constraints are non-empty",
                FailureCode::Conflict,
            )
        }
    }

    fn execute(&self, input: &OperatorValue) -> Result<OperatorValue, OperatorError> {
        let value = input.as_value().cloned().unwrap_or(serde_json::Value::Null);
        for constraint in &self.constraints {
            let predicate = &constraint.predicate;
            let outcome = catch_unwind(AssertUnwindSafe(|| predicate(&value)));
            match outcome {
                Ok(true) => continue,
                Ok(false) => {
                    let result = ValidationResult::fail(
                        format!("constraint '{}' was violated", constraint.name),
                        FailureCode::PolicyViolation,
                    );
                    return Ok(OperatorValue::Attributes {
                        attributes: [(
                            "validation_result".to_string(),
                            serde_json::to_value(&result).unwrap_or(serde_json::Value::Null),
                        )]
                        .into_iter()
                        .collect(),
                    });
                }
                Err(_) => {
                    let result = ValidationResult::fail(
                        format!("constraint '{}' raised an error", constraint.name),
                        FailureCode::ToolError,
                    );
                    return Ok(OperatorValue::Attributes {
                        attributes: [(
                            "validation_result".to_string(),
                            serde_json::to_value(&result).unwrap_or(serde_json::Value::Null),
                        )]
                        .into_iter()
                        .collect(),
                    });
                }
            }
        }
        let result = ValidationResult::ok("all constraints satisfied");
        Ok(OperatorValue::Attributes {
            attributes: [(
                "validation_result".to_string(),
                serde_json::to_value(&result).unwrap_or(serde_json::Value::Null),
            )]
            .into_iter()
            .collect(),
        })
    }

    fn run_oracle_checks(&self, _input: &OperatorValue, _output: &OperatorValue) -> Vec<ValidationResult> {
        Vec::new()
    }
}
