// crates/aecp-execution/src/audit_hook.rs
// ============================================================================
// Module: Execution Audit Hook
// Description: The structured event shape and sink trait the execution
//              wrapper emits into the plane's audit chain.
// Purpose: Decouple `aecp-execution` from a concrete audit chain
//          implementation (`aecp-audit`) in the same way `aecp-sandbox`
//          decouples its lifecycle events.
// Dependencies: aecp-core, serde_json
// ============================================================================

//! ## Overview
//! `spec.md` §6's telemetry sink contract lists `tool_call`, `crv_result`,
//! and `policy_check` among the event types every invocation emits. This
//! module defines that event shape and the sink trait `aecp-plane`
//! implements to forward events into the real audit chain.

use aecp_core::PrincipalId;
use aecp_core::StepId;
use aecp_core::TaskId;
use aecp_core::ToolId;
use aecp_core::WorkflowId;
use serde_json::Value;

/// A structured execution-wrapper event.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionAuditEvent {
    /// The workflow this invocation belongs to.
    pub workflow_id: WorkflowId,
    /// The task this invocation belongs to.
    pub task_id: TaskId,
    /// The step within the task.
    pub step_id: StepId,
    /// The tool invoked.
    pub tool_id: ToolId,
    /// The principal on whose behalf the invocation runs.
    pub principal_id: PrincipalId,
    /// Event type tag, e.g. `"policy_check"`, `"crv_result"`,
    /// `"tool_call"`.
    pub event_type: &'static str,
    /// Free-form structured event data.
    pub data: Value,
}

/// A sink that records [`ExecutionAuditEvent`]s.
pub trait ExecutionAuditSink: Send + Sync {
    /// Records an execution audit event.
    fn record(&self, event: ExecutionAuditEvent);
}

/// An audit sink that discards every event. The safe default for
/// standalone use and unit tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullExecutionAuditSink;

impl ExecutionAuditSink for NullExecutionAuditSink {
    fn record(&self, _event: ExecutionAuditEvent) {}
}
