// crates/aecp-validation/src/operator.rs
// ============================================================================
// Module: Operator Contract
// Description: The shared trait every validation operator implements, plus
//              the tagged-variant payload operators exchange.
// Purpose: Let a pipeline compose heterogeneous operators behind a single
//          object-safe trait without an enum of operator kinds.
// Dependencies: aecp-core
// ============================================================================

//! ## Overview
//! Operator inputs/outputs are represented as [`OperatorValue`], a tagged
//! sum type over the known shapes the standard operators exchange plus a
//! free-form attribute map, rather than an untyped `serde_json::Value`
//! threaded through every call. Operators declare the case they expect and
//! fail fast with [`FailureCode::Conflict`] when handed the wrong shape —
//! this is the duck-typing boundary the plane's symbolic store otherwise
//! avoids (see `SPEC_FULL.md` design notes).

use std::collections::BTreeMap;

use aecp_core::FailureCode;
use aecp_core::ValidationResult;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// A tagged-variant payload exchanged between operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "case", rename_all = "snake_case")]
pub enum OperatorValue {
    /// Raw, unprocessed tool output.
    Raw {
        /// The raw value, or absent entirely.
        value: Option<Value>,
    },
    /// An extracted field projection.
    Extracted {
        /// Extracted value.
        value: Value,
    },
    /// A normalized canonical form.
    Normalized {
        /// Canonicalized value.
        value: Value,
    },
    /// A pair of values to compare.
    Comparison {
        /// Expected value.
        expected: Value,
        /// Actual value.
        actual: Value,
    },
    /// The output of a comparison.
    Compared {
        /// Whether the values matched.
        matched: bool,
        /// Structural diff, present when `matched` is false.
        diff: Option<Value>,
    },
    /// A free-form attribute map, the escape hatch for operators that do
    /// not fit a known case.
    Attributes {
        /// Free-form key/value attributes.
        attributes: BTreeMap<String, Value>,
    },
}

impl OperatorValue {
    /// Returns the inner JSON value for cases that carry exactly one,
    /// collapsing `Raw`/`Extracted`/`Normalized` into a common accessor.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Raw { value } => value.as_ref(),
            Self::Extracted { value } | Self::Normalized { value } => Some(value),
            Self::Comparison { .. } | Self::Compared { .. } | Self::Attributes { .. } => None,
        }
    }

    /// Builds a [`ValidationResult::fail`] tagged [`FailureCode::Conflict`]
    /// for an operator that received a case it does not handle.
    #[must_use]
    pub fn unexpected_case(expected: &str, operator: &str) -> ValidationResult {
        ValidationResult::fail(
            format!("{operator} expected a {expected} payload but received a different case"),
            FailureCode::Conflict,
        )
    }
}

/// Errors an operator's `execute` step can raise. These never cross the
/// pipeline boundary directly — the pipeline catches them and converts to a
/// [`ValidationResult`] tagged [`FailureCode::ToolError`], matching
/// `spec.md` §4.1 ("a thrown predicate yields `tool_error`").
#[derive(Debug, Clone, thiserror::Error)]
pub enum OperatorError {
    /// The operator could not process its input.
    #[error("operator {operator} failed: {message}")]
    Failed {
        /// Operator name.
        operator: String,
        /// Failure message.
        message: String,
    },
}

/// The contract every validation operator implements.
///
/// # Invariants
/// - If [`Operator::validate_invariants`] returns an invalid result for a
///   given input, [`Operator::execute`] on that same input must fail (see
///   `spec.md` §8 property 1).
pub trait Operator: Send + Sync {
    /// A short, stable name used in logs and failure messages.
    fn name(&self) -> &'static str;

    /// Checks preconditions on the input before execution. Returning an
    /// invalid result here is a hard precondition failure, not advisory.
    fn validate_invariants(&self, input: &OperatorValue) -> ValidationResult;

    /// Transforms `input` into the next stage's payload.
    ///
    /// # Errors
    /// Returns [`OperatorError`] when the operator cannot produce output at
    /// all (as opposed to producing an output that later fails an oracle
    /// check).
    fn execute(&self, input: &OperatorValue) -> Result<OperatorValue, OperatorError>;

    /// Runs post-execution sanity checks relating `input` and `output`.
    /// Returns one result per check; an empty vec means no oracle checks
    /// are defined for this operator.
    fn run_oracle_checks(&self, input: &OperatorValue, output: &OperatorValue) -> Vec<ValidationResult>;
}
