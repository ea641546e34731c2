// crates/aecp-core/src/taxonomy.rs
// ============================================================================
// Module: Failure Taxonomy
// Description: The closed enumeration of failure codes surfaced by every
//              validator, gate, and execution path in the plane.
// Purpose: Give callers a stable, programmatically-handled category for
//          every rejection, paired with a fixed remediation hint.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! `FailureCode` is the only surface for categorizing a failure anywhere in
//! the plane — validators, the policy gate, the effort evaluator, the
//! sandbox, and the tool execution wrapper all populate this same
//! enumeration rather than inventing per-component error categories. Each
//! code is paired with a fixed remediation string via [`remediation_for`],
//! so a caller can self-heal (retry an alternate tool, ask a human,
//! escalate, or ignore with justification) without parsing free text.

use serde::Deserialize;
use serde::Serialize;

/// The closed failure taxonomy used throughout the plane.
///
/// # Invariants
/// - This enumeration is exhaustive by design; adding a variant is a
///   breaking change and must update [`remediation_for`] in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    /// Required data was absent (e.g. a missing schema field).
    MissingData,
    /// Two values that were expected to agree did not.
    Conflict,
    /// The action or data fell outside the declared scope.
    OutOfScope,
    /// A result was produced but confidence fell below threshold.
    LowConfidence,
    /// A named predicate or policy rule was violated.
    PolicyViolation,
    /// The underlying tool raised an error or timed out.
    ToolError,
    /// Repeated evaluation of the same input produced different output.
    NonDeterminism,
}

impl FailureCode {
    /// Returns the wire tag used for this code (stable, lowercase, snake_case).
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::MissingData => "missing_data",
            Self::Conflict => "conflict",
            Self::OutOfScope => "out_of_scope",
            Self::LowConfidence => "low_confidence",
            Self::PolicyViolation => "policy_violation",
            Self::ToolError => "tool_error",
            Self::NonDeterminism => "non_determinism",
        }
    }
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Returns the fixed remediation hint catalogued for a failure code.
///
/// The catalog is intentionally static: remediation hints are part of the
/// plane's contract with callers (see `spec.md` §7, "Every rejection
/// includes ... the remediation hint") and must not vary by call site.
#[must_use]
pub const fn remediation_for(code: FailureCode) -> &'static str {
    match code {
        FailureCode::MissingData => {
            "supply the missing field or ask the user to provide it before retrying"
        }
        FailureCode::Conflict => "reconcile the conflicting values, then retry with updated input",
        FailureCode::OutOfScope => "the action falls outside the declared scope; narrow the request",
        FailureCode::LowConfidence => {
            "confidence was below threshold; escalate to a human reviewer"
        }
        FailureCode::PolicyViolation => {
            "the action violates policy; request approval or choose a permitted alternative"
        }
        FailureCode::ToolError => "retry with an alternate tool or inspect the tool error detail",
        FailureCode::NonDeterminism => {
            "repeated evaluation disagreed; treat the result as unreliable and re-run"
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
    use super::FailureCode;
    use super::remediation_for;

    #[test]
    fn every_code_has_a_nonempty_remediation() {
        let codes = [
            FailureCode::MissingData,
            FailureCode::Conflict,
            FailureCode::OutOfScope,
            FailureCode::LowConfidence,
            FailureCode::PolicyViolation,
            FailureCode::ToolError,
            FailureCode::NonDeterminism,
        ];
        for code in codes {
            assert!(!remediation_for(code).is_empty());
        }
    }

    #[test]
    fn tag_round_trips_through_serde() {
        let json = serde_json::to_string(&FailureCode::PolicyViolation).expect("serialize");
        assert_eq!(json, "\"policy_violation\"");
    }
}
