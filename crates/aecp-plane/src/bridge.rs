// crates/aecp-plane/src/bridge.rs
// ============================================================================
// Module: Audit Bridge
// Description: Translates the execution wrapper's and sandbox's own
//              audit-hook events into appends on the real hash-chained
//              audit log, and forwards a telemetry-shaped copy of each.
// Purpose: aecp-execution and aecp-sandbox each define a local audit-hook
//          trait (so neither depends on aecp-audit directly); this is the
//          one place that implements both against a live AuditChain.
// Dependencies: aecp-audit, aecp-core, aecp-execution, aecp-sandbox,
//               aecp-telemetry
// ============================================================================

//! ## Overview
//! `aecp-execution::ExecutionAuditSink` and `aecp-sandbox::SandboxAuditSink`
//! are deliberately decoupled from `aecp-audit` so a lower-level crate
//! never has to depend on the audit chain's storage contract. `ChainAuditBridge`
//! is the facade crate's answer: one struct holding an `Arc<AuditChain>`
//! and an `Arc<dyn TelemetrySink>`, implementing both hook traits by
//! appending to the chain and re-emitting the same data as a telemetry
//! event.

use std::sync::Arc;

use aecp_audit::AuditChain;
use aecp_core::Provenance;
use aecp_core::Timestamp;
use aecp_execution::audit_hook::ExecutionAuditEvent;
use aecp_execution::audit_hook::ExecutionAuditSink;
use aecp_sandbox::audit_hook::SandboxAuditEvent;
use aecp_sandbox::audit_hook::SandboxAuditSink;
use aecp_telemetry::EventKind;
use aecp_telemetry::TelemetryEvent;
use aecp_telemetry::TelemetrySink;
use serde_json::Value;
use serde_json::json;
use tracing::error;

fn event_kind_for(event_type: &str) -> EventKind {
    match event_type {
        "tool_call" => EventKind::ToolCall,
        "crv_result" => EventKind::CrvResult,
        "policy_check" | "effort_evaluation" => EventKind::PolicyCheck,
        "sandbox_created" => EventKind::SandboxCreated,
        "sandbox_destroyed" => EventKind::SandboxDestroyed,
        "permission_check" | "resource_reserved" | "resource_denied" => EventKind::PermissionCheck,
        _ => EventKind::EscalationRequested,
    }
}

/// Bridges the execution and sandbox audit hooks into a live
/// [`AuditChain`] plus a [`TelemetrySink`].
///
/// Neither hook trait's event carries a `state_before`/`state_after`/`diff`
/// triple the way a direct `AuditChain::append` caller would supply; this
/// bridge records the hook's `data` payload as `state_after` with
/// `state_before` absent, since the hook only ever reports a decision or
/// observation, never a state transition.
pub struct ChainAuditBridge {
    chain: Arc<AuditChain>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl ChainAuditBridge {
    /// Creates a new bridge over an existing chain and telemetry sink.
    #[must_use]
    pub fn new(chain: Arc<AuditChain>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self { chain, telemetry }
    }

    fn record(&self, actor: &str, action_name: &'static str, workflow_id: &str, task_id: &str, provenance: Provenance, data: Value) {
        let now = Timestamp::now();
        if let Err(err) = self.chain.append(uuid_like(actor, action_name, now), now, actor, action_name, None, Some(data.clone()), None, provenance) {
            error!(error = %err, actor, action_name, "failed to append audit entry from bridge");
        }
        self.telemetry.emit_event(TelemetryEvent {
            kind: event_kind_for(action_name),
            workflow_id: workflow_id.to_string(),
            task_id: task_id.to_string(),
            timestamp: now,
            data,
        });
    }
}

/// Builds a reasonably-unique entry id without reaching for a UUID crate:
/// actor, action, and timestamp together are unique enough for an
/// append-only audit trail, and collisions are harmless (the chain keys
/// off `sequence`, not `id`).
fn uuid_like(actor: &str, action_name: &str, now: Timestamp) -> String {
    format!("{actor}-{action_name}-{}", now.unix_millis())
}

impl ExecutionAuditSink for ChainAuditBridge {
    fn record(&self, event: ExecutionAuditEvent) {
        let provenance = Provenance {
            task_id: Some(event.task_id.clone()),
            step_id: Some(event.step_id.clone()),
            source_event_id: None,
        };
        let data = json!({
            "tool_id": event.tool_id.as_str(),
            "principal_id": event.principal_id.as_str(),
            "payload": event.data,
        });
        self.record(event.principal_id.as_str(), event.event_type, event.workflow_id.as_str(), event.task_id.as_str(), provenance, data);
    }
}

impl SandboxAuditSink for ChainAuditBridge {
    fn record(&self, event: SandboxAuditEvent) {
        let provenance = Provenance {
            task_id: Some(event.task_id.clone()),
            step_id: None,
            source_event_id: None,
        };
        let data = json!({
            "sandbox_id": event.sandbox_id.as_str(),
            "tool_id": event.tool_id.as_ref().map(aecp_core::ToolId::as_str),
            "principal_id": event.principal_id.as_str(),
            "payload": event.data,
        });
        self.record(event.principal_id.as_str(), event.event_type, event.workflow_id.as_str(), event.task_id.as_str(), provenance, data);
    }
}

/// Hands `ToolExecutionWrapper` a `Box<dyn ExecutionAuditSink>` that
/// forwards into a shared [`ChainAuditBridge`], since the wrapper owns its
/// sink rather than sharing it by reference.
pub struct ExecutionSinkHandle(Arc<ChainAuditBridge>);

impl ExecutionSinkHandle {
    /// Wraps a shared bridge for handoff to a `ToolExecutionWrapper`.
    #[must_use]
    pub const fn new(bridge: Arc<ChainAuditBridge>) -> Self {
        Self(bridge)
    }
}

impl ExecutionAuditSink for ExecutionSinkHandle {
    fn record(&self, event: ExecutionAuditEvent) {
        ExecutionAuditSink::record(self.0.as_ref(), event);
    }
}

/// Hands `Sandbox` a `Box<dyn SandboxAuditSink>` that forwards into a
/// shared [`ChainAuditBridge`], since the sandbox owns its sink rather
/// than sharing it by reference.
pub struct SandboxSinkHandle(Arc<ChainAuditBridge>);

impl SandboxSinkHandle {
    /// Wraps a shared bridge for handoff to a `Sandbox`.
    #[must_use]
    pub const fn new(bridge: Arc<ChainAuditBridge>) -> Self {
        Self(bridge)
    }
}

impl SandboxAuditSink for SandboxSinkHandle {
    fn record(&self, event: SandboxAuditEvent) {
        SandboxAuditSink::record(self.0.as_ref(), event);
    }
}
