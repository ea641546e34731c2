// crates/aecp-sandbox/src/escalation.rs
// ============================================================================
// Module: Escalation Manager
// Description: Routes denied permission checks to an escalation handler and
//              mutates sandbox permissions on approval.
// Purpose: Let a sandbox request, at the point of denial, a one-time grant
//          for the remainder of its life.
// Dependencies: aecp-core, crate::permission
// ============================================================================

//! ## Overview
//! Implements `spec.md` §4.4's escalation manager. On a denied check, if
//! the action permits escalation, a request is synchronously routed to an
//! [`EscalationHandler`]. Approval mutates the sandbox's permissions for
//! the remainder of its life (not persisted across sandbox destruction,
//! per `spec.md` §9's open-question resolution); denial propagates as
//! failure with code `policy_violation`.

use aecp_core::FailureCode;
use aecp_core::PrincipalId;
use serde::Deserialize;
use serde::Serialize;

/// A request to escalate a specific denied permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRequest {
    /// Principal requesting the escalation.
    pub principal_id: PrincipalId,
    /// The resource the denied check was about.
    pub resource: String,
    /// Reason the escalation is being requested.
    pub reason: String,
}

/// The escalation handler's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationDecision {
    /// Whether the escalation was granted.
    pub granted: bool,
    /// Identifier of the approver, if granted by a human/service.
    pub approver_id: Option<String>,
    /// A capability name granted alongside the approval, if any. The
    /// sandbox's permission envelope is mutated to include it.
    pub granted_capability: Option<String>,
}

/// The externally-driven escalation handler contract (`spec.md` §6): may be
/// synchronous (auto-deny) or asynchronous (awaits a human). This trait
/// models the synchronous surface the sandbox calls; an async
/// implementation blocks internally until the human responds.
pub trait EscalationHandler: Send + Sync {
    /// Requests escalation for the given principal/resource/reason.
    fn request_escalation(&self, request: &EscalationRequest) -> EscalationDecision;
}

/// An escalation handler that always denies; the safe default.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDenyEscalationHandler;

impl EscalationHandler for AutoDenyEscalationHandler {
    fn request_escalation(&self, _request: &EscalationRequest) -> EscalationDecision {
        EscalationDecision {
            granted: false,
            approver_id: None,
            granted_capability: None,
        }
    }
}

/// The outcome of attempting to escalate a denied check.
#[derive(Debug, Clone)]
pub enum EscalationOutcome {
    /// The handler granted the escalation; the sandbox's capability set was
    /// extended if `granted_capability` was present in the decision.
    Granted {
        /// The decision returned by the handler.
        decision: EscalationDecision,
    },
    /// The handler denied the escalation, or the underlying check could
    /// not be escalated at all.
    Denied {
        /// Failure code to surface to the caller.
        code: FailureCode,
        /// Human-readable reason.
        reason: String,
    },
}

/// Coordinates escalation requests against a handler.
pub struct EscalationManager<'a> {
    handler: &'a dyn EscalationHandler,
}

impl<'a> EscalationManager<'a> {
    /// Creates a new manager bound to the given handler.
    #[must_use]
    pub const fn new(handler: &'a dyn EscalationHandler) -> Self {
        Self { handler }
    }

    /// Attempts to escalate a denied, escalable check.
    #[must_use]
    pub fn escalate(&self, can_escalate: bool, request: EscalationRequest) -> EscalationOutcome {
        if !can_escalate {
            return EscalationOutcome::Denied {
                code: FailureCode::PolicyViolation,
                reason: "this check cannot be escalated (hard limit)".to_string(),
            };
        }
        let decision = self.handler.request_escalation(&request);
        if decision.granted {
            EscalationOutcome::Granted { decision }
        } else {
            EscalationOutcome::Denied {
                code: FailureCode::PolicyViolation,
                reason: format!("escalation denied for {}", request.resource),
            }
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
    use aecp_core::PrincipalId;

    use super::AutoDenyEscalationHandler;
    use super::EscalationDecision;
    use super::EscalationHandler;
    use super::EscalationManager;
    use super::EscalationOutcome;
    use super::EscalationRequest;

    #[test]
    fn scenario_s5_escalation_denied() {
        let manager = EscalationManager::new(&AutoDenyEscalationHandler);
        let request = EscalationRequest {
            principal_id: PrincipalId::new("agent-1"),
            resource: "/etc/passwd".to_string(),
            reason: "read requested".to_string(),
        };
        let outcome = manager.escalate(true, request);
        assert!(matches!(outcome, EscalationOutcome::Denied { .. }));
    }

    #[test]
    fn hard_limit_cannot_be_escalated_even_with_approving_handler() {
        struct AlwaysApprove;
        impl EscalationHandler for AlwaysApprove {
            fn request_escalation(&self, _request: &EscalationRequest) -> EscalationDecision {
                EscalationDecision {
                    granted: true,
                    approver_id: Some("human-1".to_string()),
                    granted_capability: None,
                }
            }
        }
        let manager = EscalationManager::new(&AlwaysApprove);
        let request = EscalationRequest {
            principal_id: PrincipalId::new("agent-1"),
            resource: "execution_time_ms".to_string(),
            reason: "need more time".to_string(),
        };
        let outcome = manager.escalate(false, request);
        assert!(matches!(outcome, EscalationOutcome::Denied { .. }));
    }

    #[test]
    fn escalable_check_with_approving_handler_grants() {
        struct AlwaysApprove;
        impl EscalationHandler for AlwaysApprove {
            fn request_escalation(&self, _request: &EscalationRequest) -> EscalationDecision {
                EscalationDecision {
                    granted: true,
                    approver_id: Some("human-1".to_string()),
                    granted_capability: Some("net.raw".to_string()),
                }
            }
        }
        let manager = EscalationManager::new(&AlwaysApprove);
        let request = EscalationRequest {
            principal_id: PrincipalId::new("agent-1"),
            resource: "cpu".to_string(),
            reason: "needs more cpu".to_string(),
        };
        let outcome = manager.escalate(true, request);
        assert!(matches!(outcome, EscalationOutcome::Granted { .. }));
    }
}
