// crates/aecp-policy/src/lib.rs
// ============================================================================
// Module: Goal-Guard Policy Gate
// Description: A finite-state guard classifying actions by risk and intent.
// Purpose: Enforce principal permissions and decide allow /
//          require-approval / deny.
// Dependencies: aecp-core
// ============================================================================

//! ## Overview
//! Implements `spec.md` §4.2. `GoalGuard::evaluate` drives the state
//! machine through its three checks in order — permission coverage, tool
//! allow-list membership, and the risk-tier/intent matrix — and returns a
//! terminal [`PolicyVerdict`]. The machine never runs a tool itself; it
//! only classifies.

use aecp_core::Action;
use aecp_core::Principal;
use aecp_core::RiskTier;
use aecp_core::ToolId;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

/// States the Goal-Guard machine can terminate in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyState {
    /// Transient state while checks are running; never returned from
    /// [`GoalGuard::evaluate`], only used internally for clarity.
    Evaluating,
    /// The action may proceed.
    Allowed,
    /// The action requires human approval before proceeding.
    ApprovalRequired,
    /// The action is denied outright.
    Denied,
}

/// The output of a Goal-Guard evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyVerdict {
    /// Terminal state.
    pub state: PolicyState,
    /// Human-readable reason for the verdict.
    pub reason: String,
    /// Justification required from the approver, present when
    /// `state == ApprovalRequired`.
    pub required_approval: Option<String>,
    /// A short hint suitable for the audit entry recording this check.
    pub audit_hint: String,
}

impl PolicyVerdict {
    /// Whether the action may proceed without further approval.
    #[must_use]
    pub fn allowed(&self) -> bool {
        matches!(self.state, PolicyState::Allowed)
    }

    fn allow(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            state: PolicyState::Allowed,
            audit_hint: format!("allowed: {reason}"),
            reason,
            required_approval: None,
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            state: PolicyState::Denied,
            audit_hint: format!("denied: {reason}"),
            reason,
            required_approval: None,
        }
    }

    fn approval_required(reason: impl Into<String>, justification: impl Into<String>) -> Self {
        let reason = reason.into();
        let justification = justification.into();
        Self {
            state: PolicyState::ApprovalRequired,
            audit_hint: format!("approval_required: {reason}"),
            reason,
            required_approval: Some(justification),
        }
    }
}

/// The Goal-Guard policy gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoalGuard;

impl GoalGuard {
    /// Creates a new Goal-Guard instance. The machine is stateless across
    /// calls; all state lives in the arguments to [`Self::evaluate`].
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluates an action attempt by `principal`, optionally naming the
    /// concrete `tool_id` being invoked (checked against the action's
    /// allow-list, if non-empty).
    #[must_use]
    pub fn evaluate(&self, principal: &Principal, action: &Action, tool_id: Option<&ToolId>) -> PolicyVerdict {
        if let Some(verdict) = self.check_permissions(principal, action) {
            warn!(principal = %principal.id, action = %action.name, reason = %verdict.reason, "policy denied on permission check");
            return verdict;
        }
        if let Some(verdict) = self.check_tool_allow_list(action, tool_id) {
            warn!(principal = %principal.id, action = %action.name, reason = %verdict.reason, "policy denied on tool allow-list check");
            return verdict;
        }
        let verdict = self.check_risk_and_intent(action);
        debug!(principal = %principal.id, action = %action.name, state = ?verdict.state, "policy evaluation completed");
        verdict
    }

    fn check_permissions(&self, principal: &Principal, action: &Action) -> Option<PolicyVerdict> {
        for required in &action.required_permissions {
            let granted_zone = principal.zone_for(&required.action, &required.resource);
            match (granted_zone, required.data_zone) {
                (None, _) => {
                    return Some(PolicyVerdict::deny(format!(
                        "principal {} lacks permission for {} on {}",
                        principal.id, required.action, required.resource
                    )));
                }
                (Some(granted), Some(required_zone)) if granted < required_zone => {
                    return Some(PolicyVerdict::deny(format!(
                        "principal {} holds zone below required zone for {} on {}",
                        principal.id, required.action, required.resource
                    )));
                }
                _ => {}
            }
        }
        None
    }

    fn check_tool_allow_list(&self, action: &Action, tool_id: Option<&ToolId>) -> Option<PolicyVerdict> {
        if action.allowed_tools.is_empty() {
            return None;
        }
        match tool_id {
            Some(tool_id) if action.allowed_tools.contains(tool_id) => None,
            Some(tool_id) => Some(PolicyVerdict::deny(format!(
                "tool {tool_id} is not on action {}'s allow-list",
                action.name
            ))),
            None => Some(PolicyVerdict::deny(format!(
                "action {} requires a tool from its allow-list but none was named",
                action.name
            ))),
        }
    }

    fn check_risk_and_intent(&self, action: &Action) -> PolicyVerdict {
        match action.risk_tier {
            RiskTier::Low => PolicyVerdict::allow("low risk tier"),
            RiskTier::Medium => {
                if action.intent.is_elevated() {
                    PolicyVerdict::approval_required(
                        "medium risk with elevated intent",
                        format!("approve {:?} intent on action {}", action.intent, action.name),
                    )
                } else {
                    PolicyVerdict::allow("medium risk with read-only intent")
                }
            }
            RiskTier::High => PolicyVerdict::approval_required(
                "high risk tier always requires approval",
                format!("approve high-risk action {}", action.name),
            ),
            RiskTier::Critical => PolicyVerdict::approval_required(
                "critical risk tier requires strict justification",
                format!(
                    "approve critical action {} with a documented justification",
                    action.name
                ),
            ),
        }
    }
}
