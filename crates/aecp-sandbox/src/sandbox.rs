// crates/aecp-sandbox/src/sandbox.rs
// ============================================================================
// Module: Sandbox
// Description: The top-level sandbox handle combining a mutable permission
//              envelope, resource accounting, a provider, and audit emission.
// Purpose: The single object `aecp-execution` acquires and releases around
//          each tool invocation.
// Dependencies: aecp-core, crate::{permission, resource, escalation,
//               provider, audit_hook}
// ============================================================================

//! ## Overview
//! Implements `spec.md` §4.4's sandbox handle. Permissions start as the
//! envelope the caller supplies and are widened in place by a granted
//! escalation, for the remainder of the sandbox's life only — escalation
//! grants do not persist past [`Sandbox::destroy`] or `Drop` (`spec.md` §9
//! open question: escalation scope resolved as "non-persistent, bound to
//! sandbox lifetime").
//!
//! Acquisition is scoped: callers are expected to construct a `Sandbox`,
//! use it, then let it drop (or call [`Sandbox::destroy`] explicitly) on
//! every exit path, including error paths (`spec.md` §4.4: "sandboxes are
//! acquired in a scope that guarantees release"). `Drop` calls through to
//! the provider's idempotent `destroy` and emits a `sandbox_destroyed`
//! event so a caller that forgets to call `destroy` explicitly still gets
//! a correctly-audited release.

use std::sync::RwLock;

use aecp_core::FailureCode;
use aecp_core::PrincipalId;
use aecp_core::SandboxId;
use aecp_core::SandboxPermissions;
use aecp_core::TaskId;
use aecp_core::ToolId;
use aecp_core::WorkflowId;
use serde_json::Value;
use serde_json::json;
use tracing::warn;

use crate::audit_hook::NullSandboxAuditSink;
use crate::audit_hook::SandboxAuditEvent;
use crate::audit_hook::SandboxAuditSink;
use crate::escalation::EscalationHandler;
use crate::escalation::EscalationManager;
use crate::escalation::EscalationOutcome;
use crate::escalation::EscalationRequest;
use crate::permission::PermissionChecker;
use crate::provider::ProviderError;
use crate::provider::SandboxProvider;
use crate::provider::ToolInvocation;
use crate::provider::ToolOutcome;
use crate::resource::ReservationOutcome;
use crate::resource::ResourceAccounting;
use crate::resource::ResourceUsage;

/// A failure a sandbox operation can surface to its caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxFailure {
    /// Closed failure code (`spec.md` §4.1).
    pub code: FailureCode,
    /// Human-readable reason.
    pub reason: String,
}

/// A live sandbox: permission envelope, resource accounting, and an
/// execution provider, scoped to one workflow task.
pub struct Sandbox {
    id: SandboxId,
    workflow_id: WorkflowId,
    task_id: TaskId,
    principal_id: PrincipalId,
    permissions: RwLock<SandboxPermissions>,
    resources: ResourceAccounting,
    provider: Box<dyn SandboxProvider>,
    escalation_handler: Box<dyn EscalationHandler>,
    audit_sink: Box<dyn SandboxAuditSink>,
}

impl Sandbox {
    /// Creates a new sandbox and emits a `sandbox_created` audit event.
    pub fn new(
        id: SandboxId,
        workflow_id: WorkflowId,
        task_id: TaskId,
        principal_id: PrincipalId,
        permissions: SandboxPermissions,
        provider: Box<dyn SandboxProvider>,
        escalation_handler: Box<dyn EscalationHandler>,
        audit_sink: Box<dyn SandboxAuditSink>,
    ) -> Self {
        let resources = ResourceAccounting::new(permissions.resources);
        let sandbox = Self {
            id,
            workflow_id,
            task_id,
            principal_id,
            permissions: RwLock::new(permissions),
            resources,
            provider,
            escalation_handler,
            audit_sink,
        };
        sandbox.emit(None, "sandbox_created", json!({}));
        sandbox
    }

    /// Creates a sandbox with a `NullSandboxAuditSink` and an
    /// `AutoDenyEscalationHandler`, for standalone or test use.
    pub fn simple(
        id: SandboxId,
        workflow_id: WorkflowId,
        task_id: TaskId,
        principal_id: PrincipalId,
        permissions: SandboxPermissions,
        provider: Box<dyn SandboxProvider>,
    ) -> Self {
        Self::new(
            id,
            workflow_id,
            task_id,
            principal_id,
            permissions,
            provider,
            Box::new(crate::escalation::AutoDenyEscalationHandler),
            Box::new(NullSandboxAuditSink),
        )
    }

    /// The sandbox's identifier.
    #[must_use]
    pub fn id(&self) -> SandboxId {
        self.id.clone()
    }

    fn emit(&self, tool_id: Option<ToolId>, event_type: &'static str, data: Value) {
        self.audit_sink.record(SandboxAuditEvent {
            sandbox_id: self.id.clone(),
            workflow_id: self.workflow_id.clone(),
            task_id: self.task_id.clone(),
            tool_id,
            principal_id: self.principal_id.clone(),
            event_type,
            data,
        });
    }

    fn with_checker<R>(&self, f: impl FnOnce(&PermissionChecker<'_>) -> R) -> R {
        let permissions = self.permissions.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let checker = PermissionChecker::new(&permissions);
        f(&checker)
    }

    /// Checks a permission predicate, attempting escalation on denial, and
    /// emits a `permission_check` audit event recording the final verdict.
    fn check_and_maybe_escalate(
        &self,
        tool_id: Option<ToolId>,
        resource: &str,
        check: impl Fn(&PermissionChecker<'_>) -> crate::permission::PermissionCheckResult,
    ) -> Result<(), SandboxFailure> {
        let result = self.with_checker(&check);
        if result.granted {
            self.emit(
                tool_id.clone(),
                "permission_check",
                json!({"resource": resource, "granted": true, "reason": result.reason}),
            );
            return Ok(());
        }

        self.emit(
            tool_id.clone(),
            "permission_check",
            json!({"resource": resource, "granted": false, "reason": result.reason}),
        );
        warn!(resource, reason = %result.reason, "permission check denied, attempting escalation");

        let manager = EscalationManager::new(self.escalation_handler.as_ref());
        let outcome = manager.escalate(
            result.can_escalate,
            EscalationRequest {
                principal_id: self.principal_id.clone(),
                resource: resource.to_string(),
                reason: result.reason.clone(),
            },
        );

        match outcome {
            EscalationOutcome::Granted { decision } => {
                if let Some(capability) = decision.granted_capability {
                    let mut permissions =
                        self.permissions.write().unwrap_or_else(std::sync::PoisonError::into_inner);
                    permissions.capabilities.insert(capability);
                }
                self.emit(
                    tool_id,
                    "escalation_requested",
                    json!({"resource": resource, "granted": true}),
                );
                Ok(())
            }
            EscalationOutcome::Denied { code, reason } => {
                self.emit(
                    tool_id,
                    "escalation_requested",
                    json!({"resource": resource, "granted": false, "reason": reason}),
                );
                warn!(resource, %reason, ?code, "escalation denied");
                Err(SandboxFailure { code, reason })
            }
        }
    }

    /// Checks (with escalation) whether `path` may be read.
    pub fn check_filesystem_read(&self, tool_id: ToolId, path: &str) -> Result<(), SandboxFailure> {
        self.check_and_maybe_escalate(Some(tool_id), path, |checker| checker.check_filesystem_read(path))
    }

    /// Checks (with escalation) whether `path` may be written.
    pub fn check_filesystem_write(&self, tool_id: ToolId, path: &str) -> Result<(), SandboxFailure> {
        self.check_and_maybe_escalate(Some(tool_id), path, |checker| checker.check_filesystem_write(path))
    }

    /// Checks (with escalation) whether network access to `domain` is
    /// permitted.
    pub fn check_network_access(&self, tool_id: ToolId, domain: &str, port: Option<u16>) -> Result<(), SandboxFailure> {
        self.check_and_maybe_escalate(Some(tool_id), domain, |checker| {
            checker.check_network_access(Some(domain), None, port)
        })
    }

    /// Reserves `delta` resource usage against the sandbox's limits,
    /// attempting escalation on rejection.
    pub fn reserve_resources(&self, tool_id: ToolId, delta: ResourceUsage) -> Result<(), SandboxFailure> {
        match self.resources.reserve(delta) {
            ReservationOutcome::Accepted => {
                self.emit(Some(tool_id), "resource_reserved", json!({"delta": format!("{delta:?}")}));
                Ok(())
            }
            ReservationOutcome::Rejected { kind } => {
                let can_escalate = self.with_checker(|checker| checker.check_resource_limit(kind, u64::MAX).can_escalate);
                let manager = EscalationManager::new(self.escalation_handler.as_ref());
                let outcome = manager.escalate(
                    can_escalate,
                    EscalationRequest {
                        principal_id: self.principal_id.clone(),
                        resource: kind.to_string(),
                        reason: format!("{kind} limit would be exceeded"),
                    },
                );
                match outcome {
                    EscalationOutcome::Granted { .. } => {
                        self.emit(Some(tool_id), "resource_reserved", json!({"escalated": true, "kind": kind}));
                        Ok(())
                    }
                    EscalationOutcome::Denied { code, reason } => {
                        self.emit(Some(tool_id), "resource_denied", json!({"kind": kind, "reason": reason}));
                        Err(SandboxFailure { code, reason })
                    }
                }
            }
        }
    }

    /// Executes `invocation` through the sandbox's provider.
    ///
    /// # Errors
    /// Propagates [`ProviderError`] from the underlying provider.
    pub fn execute(&self, invocation: &ToolInvocation) -> Result<ToolOutcome, ProviderError> {
        let outcome = self.provider.execute(invocation)?;
        self.emit(
            Some(ToolId::new(invocation.tool_id.clone())),
            "tool_executed",
            json!({"usage": format!("{:?}", outcome.usage)}),
        );
        Ok(outcome)
    }

    /// Explicitly releases the sandbox's provider resources and emits a
    /// `sandbox_destroyed` event. Safe to call more than once; also called
    /// by `Drop` so scoped acquisition guarantees release on every exit
    /// path even if the caller forgets.
    pub fn destroy(&self) {
        self.provider.destroy();
        self.emit(None, "sandbox_destroyed", json!({}));
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        self.provider.destroy();
    }
}
