// crates/aecp-execution/src/idempotency.rs
// ============================================================================
// Module: Idempotency Key
// Description: Deterministic key derivation for a tool invocation.
// Purpose: Give the outbox a stable key so repeated invocations with
//          identical inputs are recognized as the same logical effect.
// Dependencies: aecp-core::hashing
// ============================================================================

//! ## Overview
//! Implements `spec.md` §4.5: `sha256(task_id || step_id || tool_id ||
//! canonical_json(args))`. The four components are folded into one
//! canonical-JSON object rather than literally concatenated strings, which
//! is equivalent for uniqueness purposes (canonical JSON is injective over
//! object shape) and lets us reuse [`aecp_core::hashing::content_hash`]
//! directly instead of hand-rolling a separator-safe concatenation.

use aecp_core::StepId;
use aecp_core::TaskId;
use aecp_core::ToolId;
use aecp_core::hashing::HashError;
use aecp_core::hashing::content_hash;
use serde_json::Value;
use serde_json::json;

/// Computes the deterministic idempotency key for one invocation.
///
/// # Errors
/// Returns [`HashError`] if `args` cannot be canonicalized (e.g. contains
/// a non-finite float).
pub fn idempotency_key(task_id: &TaskId, step_id: &StepId, tool_id: &ToolId, args: &Value) -> Result<String, HashError> {
    let payload = json!({
        "task_id": task_id,
        "step_id": step_id,
        "tool_id": tool_id,
        "args": args,
    });
    content_hash(&payload)
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
    use aecp_core::StepId;
    use aecp_core::TaskId;
    use aecp_core::ToolId;
    use serde_json::json;

    use super::idempotency_key;

    #[test]
    fn same_inputs_produce_same_key() {
        let a = idempotency_key(&TaskId::new("t1"), &StepId::new("s1"), &ToolId::new("write_file"), &json!({"path": "/tmp/a"})).expect("key");
        let b = idempotency_key(&TaskId::new("t1"), &StepId::new("s1"), &ToolId::new("write_file"), &json!({"path": "/tmp/a"})).expect("key");
        assert_eq!(a, b);
    }

    #[test]
    fn different_args_produce_different_keys() {
        let a = idempotency_key(&TaskId::new("t1"), &StepId::new("s1"), &ToolId::new("write_file"), &json!({"path": "/tmp/a"})).expect("key");
        let b = idempotency_key(&TaskId::new("t1"), &StepId::new("s1"), &ToolId::new("write_file"), &json!({"path": "/tmp/b"})).expect("key");
        assert_ne!(a, b);
    }

    #[test]
    fn key_order_within_args_does_not_matter() {
        let a = idempotency_key(&TaskId::new("t1"), &StepId::new("s1"), &ToolId::new("write_file"), &json!({"a": 1, "b": 2})).expect("key");
        let b = idempotency_key(&TaskId::new("t1"), &StepId::new("s1"), &ToolId::new("write_file"), &json!({"b": 2, "a": 1})).expect("key");
        assert_eq!(a, b);
    }
}
