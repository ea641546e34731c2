// crates/aecp-sandbox/src/lib.rs
// ============================================================================
// Module: Control Plane Sandbox Library
// Description: Public API surface for the sandbox runtime.
// Purpose: Expose permission checking, resource accounting, escalation,
//          providers, and the top-level sandbox handle.
// Dependencies: crate::{permission, resource, escalation, provider,
//               audit_hook, sandbox}
// ============================================================================

//! ## Overview
//! `aecp-sandbox` implements `spec.md` §4.4: an isolation boundary for
//! tool execution, with filesystem/network/resource/capability/env-var
//! permission checks, cumulative resource accounting, a synchronous
//! escalation path for denied-but-escalable checks, and two provider
//! implementations (simulation and concrete).

pub mod audit_hook;
pub mod escalation;
pub mod permission;
pub mod provider;
pub mod resource;
pub mod sandbox;

pub use audit_hook::NullSandboxAuditSink;
pub use audit_hook::SandboxAuditEvent;
pub use audit_hook::SandboxAuditSink;
pub use escalation::AutoDenyEscalationHandler;
pub use escalation::EscalationDecision;
pub use escalation::EscalationHandler;
pub use escalation::EscalationManager;
pub use escalation::EscalationOutcome;
pub use escalation::EscalationRequest;
pub use permission::PermissionCheckResult;
pub use permission::PermissionChecker;
pub use permission::RootedOpenError;
pub use provider::ConcreteProvider;
pub use provider::ProviderError;
pub use provider::SandboxProvider;
pub use provider::SimulationProvider;
pub use provider::ToolInvocation;
pub use provider::ToolOutcome;
pub use resource::ReservationOutcome;
pub use resource::ResourceAccounting;
pub use resource::ResourceUsage;
pub use sandbox::Sandbox;
pub use sandbox::SandboxFailure;
