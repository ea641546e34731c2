// crates/aecp-sandbox/src/audit_hook.rs
// ============================================================================
// Module: Sandbox Audit Hook
// Description: The structured event shape and sink trait the sandbox
//              emits into the plane's audit chain.
// Purpose: Decouple the sandbox from a concrete audit chain implementation
//          (`aecp-audit`) while still guaranteeing every lifecycle event
//          and permission check is recorded.
// Dependencies: aecp-core, serde_json
// ============================================================================

//! ## Overview
//! `spec.md` §4.4: "Every sandbox lifecycle event and every permission
//! check is appended to the chain with structured fields:
//! `{sandbox_id, workflow_id, task_id, tool_id, principal_id, event_type,
//! data}`." This module defines that event shape and the sink trait a
//! caller (`aecp-plane`) implements to forward events into the real audit
//! chain, so `aecp-sandbox` itself has no dependency on `aecp-audit`.

use aecp_core::PrincipalId;
use aecp_core::SandboxId;
use aecp_core::TaskId;
use aecp_core::ToolId;
use aecp_core::WorkflowId;
use serde_json::Value;

/// A structured sandbox lifecycle or permission-check event.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxAuditEvent {
    /// The sandbox this event concerns.
    pub sandbox_id: SandboxId,
    /// The workflow the sandbox belongs to.
    pub workflow_id: WorkflowId,
    /// The task the sandbox belongs to.
    pub task_id: TaskId,
    /// The tool involved, if the event concerns a specific invocation.
    pub tool_id: Option<ToolId>,
    /// The principal on whose behalf the sandbox is acting.
    pub principal_id: PrincipalId,
    /// Event type tag, e.g. `"sandbox_created"`, `"permission_check"`,
    /// `"escalation_requested"`, `"sandbox_destroyed"`.
    pub event_type: &'static str,
    /// Free-form structured event data.
    pub data: Value,
}

/// A sink that records [`SandboxAuditEvent`]s. Implemented by `aecp-plane`
/// to forward into the real audit chain; a no-op default is provided for
/// tests and standalone use of this crate.
pub trait SandboxAuditSink: Send + Sync {
    /// Records a sandbox audit event.
    fn record(&self, event: SandboxAuditEvent);
}

/// An audit sink that discards every event. The safe default for
/// standalone sandbox use and unit tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSandboxAuditSink;

impl SandboxAuditSink for NullSandboxAuditSink {
    fn record(&self, _event: SandboxAuditEvent) {}
}
