// crates/aecp-plane/src/plane.rs
// ============================================================================
// Module: Control Plane
// Description: The explicitly-constructed facade wiring policy, effort,
//              audit, snapshot, retention, and execution together, with
//              sandbox acquisition as a scoped operation per invocation.
// Purpose: The single entry point a caller builds once per deployment and
//          uses to mediate every side-effecting action an agent attempts.
// Dependencies: aecp-audit, aecp-core, aecp-effort, aecp-execution,
//               aecp-policy, aecp-sandbox, aecp-telemetry, crate::{config,
//               bridge}
// ============================================================================

//! ## Overview
//! Grounded in the teacher's `decision-gate-core::runtime::engine::ControlPlane`:
//! an explicit `new(...) -> Result<Self, _>` constructor, no global or
//! singleton state, every collaborator passed in or built from config. This
//! facade diverges from the teacher's generic-over-trait-bound shape
//! (`ControlPlane<P, D, S, Pol>`) in favor of the trait-object convention
//! `ToolExecutionWrapper` and `Sandbox` already use elsewhere in this
//! workspace, for consistency within the crate graph.
//!
//! Sandboxes are not stored on `ControlPlane`: `spec.md` §4.4 scopes
//! sandbox acquisition to "guarantee release" around one invocation, so
//! [`ControlPlane::new_sandbox`] builds a fresh [`Sandbox`] per call,
//! wired with the plane's shared escalation handler and audit bridge.

use std::sync::Arc;

use aecp_audit::AuditChain;
use aecp_audit::AuditLogPersistence;
use aecp_audit::ChainError;
use aecp_audit::RetentionTierManager;
use aecp_audit::SnapshotManager;
use aecp_audit::SnapshotPersistence;
use aecp_core::PrincipalId;
use aecp_core::SandboxId;
use aecp_core::SandboxPermissions;
use aecp_core::TaskId;
use aecp_core::Timestamp;
use aecp_core::WorkflowId;
use aecp_effort::EffortEvaluator;
use aecp_execution::ToolExecutionWrapper;
use aecp_execution::outbox::OutboxStore;
use aecp_policy::GoalGuard;
use aecp_sandbox::EscalationDecision;
use aecp_sandbox::EscalationHandler;
use aecp_sandbox::EscalationRequest;
use aecp_sandbox::Sandbox;
use aecp_sandbox::SandboxProvider;
use aecp_store::SqliteStore;
use aecp_store::SqliteStoreConfig;
use aecp_store::SqliteStoreError;
use aecp_telemetry::TelemetrySink;
use std::time::Duration;
use thiserror::Error;

use crate::bridge::ChainAuditBridge;
use crate::bridge::ExecutionSinkHandle;
use crate::bridge::SandboxSinkHandle;
use crate::config::PlaneConfig;

/// Errors raised while constructing a [`ControlPlane`].
#[derive(Debug, Error)]
pub enum PlaneError {
    /// The audit chain failed to initialize: a broken hash chain, or a
    /// persistence failure while loading it.
    #[error("audit chain failed to initialize: {0}")]
    Audit(#[from] ChainError),
    /// The `SQLite` store backing [`ControlPlane::open_sqlite`] could not be
    /// opened.
    #[error("failed to open sqlite store: {0}")]
    Store(#[from] SqliteStoreError),
}

struct SharedEscalationHandler(Arc<dyn EscalationHandler>);

impl EscalationHandler for SharedEscalationHandler {
    fn request_escalation(&self, request: &EscalationRequest) -> EscalationDecision {
        self.0.request_escalation(request)
    }
}

/// The control plane: one per deployment, built once, holding every
/// long-lived collaborator the invocation path needs.
pub struct ControlPlane {
    config: PlaneConfig,
    policy: GoalGuard,
    effort: EffortEvaluator,
    outbox: Arc<dyn OutboxStore>,
    audit: Arc<AuditChain>,
    snapshots: Arc<SnapshotManager>,
    retention: RetentionTierManager,
    telemetry: Arc<dyn TelemetrySink>,
    audit_bridge: Arc<ChainAuditBridge>,
    escalation: Arc<dyn EscalationHandler>,
}

impl ControlPlane {
    /// Builds a new control plane. Fails closed if the audit chain loaded
    /// from `audit_persistence` does not pass integrity verification
    /// (`spec.md` §7: "Chain-integrity violations during load are fatal").
    ///
    /// # Errors
    /// Returns [`PlaneError::Audit`] if the audit chain cannot be loaded or
    /// fails integrity verification.
    pub fn new(
        config: PlaneConfig,
        outbox: Arc<dyn OutboxStore>,
        audit_persistence: Box<dyn AuditLogPersistence>,
        snapshot_persistence: Box<dyn SnapshotPersistence>,
        telemetry: Arc<dyn TelemetrySink>,
        escalation: Arc<dyn EscalationHandler>,
        now: Timestamp,
    ) -> Result<Self, PlaneError> {
        let audit = Arc::new(AuditChain::new(audit_persistence)?);
        let snapshots = Arc::new(SnapshotManager::new(snapshot_persistence, config.snapshot.clone(), now));
        let retention = RetentionTierManager::new(config.retention.clone());
        let policy = GoalGuard::new();
        let effort = EffortEvaluator::new(config.effort.weights, config.effort.thresholds, config.effort.latency_budget_ms);
        let audit_bridge = Arc::new(ChainAuditBridge::new(Arc::clone(&audit), Arc::clone(&telemetry)));

        Ok(Self { config, policy, effort, outbox, audit, snapshots, retention, telemetry, audit_bridge, escalation })
    }

    /// Builds a control plane backed by a single `SQLite` store (`spec.md`
    /// §6's named durable binding), used as the audit log, snapshot store,
    /// and outbox alike. `SqliteStore` is a cheap `Arc`-backed handle, so
    /// one open connection is shared across all three roles.
    ///
    /// # Errors
    /// Returns [`PlaneError::Store`] if the database cannot be opened, or
    /// [`PlaneError::Audit`] if the loaded audit chain fails integrity
    /// verification.
    pub fn open_sqlite(
        config: PlaneConfig,
        store_config: &SqliteStoreConfig,
        telemetry: Arc<dyn TelemetrySink>,
        escalation: Arc<dyn EscalationHandler>,
        now: Timestamp,
    ) -> Result<Self, PlaneError> {
        let store = SqliteStore::open(store_config)?;
        Self::new(config, Arc::new(store.clone()), Box::new(store.clone()), Box::new(store), telemetry, escalation, now)
    }

    /// The live, hash-chained audit log.
    #[must_use]
    pub fn audit(&self) -> &Arc<AuditChain> {
        &self.audit
    }

    /// The always-on snapshot manager.
    #[must_use]
    pub fn snapshots(&self) -> &Arc<SnapshotManager> {
        &self.snapshots
    }

    /// The retention tier manager.
    #[must_use]
    pub const fn retention(&self) -> &RetentionTierManager {
        &self.retention
    }

    /// The telemetry sink shared across the plane.
    #[must_use]
    pub fn telemetry(&self) -> &Arc<dyn TelemetrySink> {
        &self.telemetry
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &PlaneConfig {
        &self.config
    }

    /// Builds a fresh, scoped sandbox for one invocation, wired with the
    /// plane's shared escalation handler and audit bridge. Callers are
    /// responsible for dropping (or explicitly destroying) the sandbox on
    /// every exit path, per `spec.md` §4.4.
    #[must_use]
    pub fn new_sandbox(
        &self,
        id: SandboxId,
        workflow_id: WorkflowId,
        task_id: TaskId,
        principal_id: PrincipalId,
        permissions: SandboxPermissions,
        provider: Box<dyn SandboxProvider>,
    ) -> Sandbox {
        Sandbox::new(
            id,
            workflow_id,
            task_id,
            principal_id,
            permissions,
            provider,
            Box::new(SharedEscalationHandler(Arc::clone(&self.escalation))),
            Box::new(SandboxSinkHandle::new(Arc::clone(&self.audit_bridge))),
        )
    }

    /// Builds a fresh [`ToolExecutionWrapper`] sharing this plane's policy
    /// gate, effort evaluator, outbox, and audit bridge. `ToolExecutionWrapper`
    /// is cheap to construct and carries no per-invocation state of its
    /// own, so building one per invocation (or reusing one across many) is
    /// equally correct.
    #[must_use]
    pub fn execution_wrapper(&self) -> ToolExecutionWrapper {
        ToolExecutionWrapper::new(
            self.policy,
            self.effort,
            Arc::clone(&self.outbox),
            Box::new(ExecutionSinkHandle::new(Arc::clone(&self.audit_bridge))),
            Duration::from_millis(self.config.invocation_timeout_ms),
        )
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
    use std::sync::Arc;

    use aecp_audit::InMemoryAuditLog;
    use aecp_audit::InMemorySnapshotStore;
    use aecp_core::Timestamp;
    use aecp_execution::InMemoryOutbox;
    use aecp_sandbox::AutoDenyEscalationHandler;
    use aecp_store::SqliteStoreConfig;
    use aecp_telemetry::NullTelemetrySink;

    use super::ControlPlane;
    use crate::config::PlaneConfig;

    fn plane() -> ControlPlane {
        ControlPlane::new(
            PlaneConfig::default(),
            Arc::new(InMemoryOutbox::default()),
            Box::new(InMemoryAuditLog::default()),
            Box::new(InMemorySnapshotStore::default()),
            Arc::new(NullTelemetrySink),
            Arc::new(AutoDenyEscalationHandler),
            Timestamp::from_unix_millis(0),
        )
        .unwrap()
    }

    #[test]
    fn new_plane_starts_with_an_empty_audit_log() {
        let plane = plane();
        assert!(plane.audit().last().is_none());
    }

    #[test]
    fn execution_wrapper_builds_without_panicking() {
        let plane = plane();
        let _wrapper = plane.execution_wrapper();
    }

    #[test]
    fn open_sqlite_shares_one_store_across_all_three_roles() {
        let plane = ControlPlane::open_sqlite(
            PlaneConfig::default(),
            &SqliteStoreConfig::in_memory(),
            Arc::new(NullTelemetrySink),
            Arc::new(AutoDenyEscalationHandler),
            Timestamp::from_unix_millis(0),
        )
        .unwrap();
        assert!(plane.audit().last().is_none());
    }
}
