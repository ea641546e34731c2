// crates/aecp-telemetry/src/escalation.rs
// ============================================================================
// Module: Escalation Handler Facade
// Description: Re-exports the escalation handler contract so callers
//              assembling the integration bridge need only depend on
//              aecp-telemetry, not aecp-sandbox directly.
// Purpose: spec.md §6 groups the telemetry sink, escalation handler, and
//          recovery executor contracts as one "integration bridge"; the
//          escalation handler itself is owned by aecp-sandbox (§4.4),
//          which already wires it into the escalation manager.
// Dependencies: aecp-sandbox
// ============================================================================

//! ## Overview
//! The escalation handler's decision type and trait live in `aecp-sandbox`
//! because the escalation manager that calls it is part of the sandbox
//! runtime (`spec.md` §4.4). This module re-exports them so a caller
//! building the integration bridge (telemetry + escalation + recovery)
//! has one crate to depend on.

pub use aecp_sandbox::AutoDenyEscalationHandler;
pub use aecp_sandbox::EscalationDecision;
pub use aecp_sandbox::EscalationHandler;
pub use aecp_sandbox::EscalationRequest;
