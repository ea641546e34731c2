// crates/aecp-validation/src/operators/decide.rs
// ============================================================================
// Module: Decide Operator
// Description: Folds a list of validation results into a single decision.
// Purpose: Final stage of a standard validation pipeline.
// Dependencies: crate::operator
// ============================================================================

use aecp_core::FailureCode;
use aecp_core::ValidationResult;
use serde::Deserialize;
use serde::Serialize;

/// The decision a [`DecideOperator`] folds a result set into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Proceed.
    Allow,
    /// Reject.
    Block,
    /// Forward to a human or a higher-authority gate.
    Escalate,
}

/// The outcome of folding a result set: a decision plus justification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecideOutcome {
    /// The folded decision.
    pub decision: Decision,
    /// Human-readable justification.
    pub justification: String,
}

/// Folds `[ValidationResult]` into `{allow, block, escalate}`.
///
/// Default policy (`spec.md` §4.1):
/// - Any invalid result -> `block`.
/// - Otherwise, minimum confidence below threshold (default `0.5`) ->
///   `escalate`.
/// - Otherwise -> `allow`.
///
/// # Invariants
/// - Determinism: identical inputs produce identical decisions (`spec.md`
///   §8 property 4: any invalid result forces `block`).
#[derive(Debug, Clone, Copy)]
pub struct DecideOperator {
    /// Minimum acceptable confidence before escalating.
    pub min_confidence: f64,
}

impl Default for DecideOperator {
    fn default() -> Self {
        Self { min_confidence: 0.5 }
    }
}

impl DecideOperator {
    /// Creates a decide operator with a custom confidence threshold.
    #[must_use]
    pub const fn with_min_confidence(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    /// Folds a result set into a single decision. This is a pure function
    /// rather than an [`crate::operator::Operator`] implementation because
    /// `Decide`'s input (`Vec<ValidationResult>`) and output
    /// (`DecideOutcome`) do not fit the pipeline's `OperatorValue` shape —
    /// `Decide` runs as the pipeline's terminal fold, not an interior
    /// stage (mirrors `spec.md` §4.1's framing of Decide as folding the
    /// accumulated result list rather than transforming a single payload).
    #[must_use]
    pub fn execute(&self, results: &[ValidationResult]) -> DecideOutcome {
        if let Some(first_invalid) = results.iter().find(|r| !r.valid) {
            return DecideOutcome {
                decision: Decision::Block,
                justification: format!(
                    "blocked: {} ({})",
                    first_invalid.reason,
                    first_invalid
                        .failure_code
                        .map_or_else(|| FailureCode::Conflict.tag(), FailureCode::tag)
                ),
            };
        }

        let min_confidence = results
            .iter()
            .map(|r| r.confidence)
            .fold(f64::INFINITY, f64::min);

        if results.is_empty() || min_confidence >= self.min_confidence {
            DecideOutcome {
                decision: Decision::Allow,
                justification: "all results valid and confidence met the threshold".to_string(),
            }
        } else {
            DecideOutcome {
                decision: Decision::Escalate,
                justification: format!(
                    "minimum confidence {min_confidence:.2} fell below threshold {:.2}",
                    self.min_confidence
                ),
            }
        }
    }
}
