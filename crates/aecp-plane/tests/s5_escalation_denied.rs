// crates/aecp-plane/tests/s5_escalation_denied.rs
// ============================================================================
// Scenario S5 — Permission escalation denied (`spec.md` §8).
// ============================================================================
//! A restrictive sandbox denies `/etc`; a read of `/etc/passwd` is
//! attempted; the escalation handler denies the request. The check fails
//! with `policy_violation`, the audit trail carries a denied
//! `permission_check` followed by a denied `escalation_requested`, and no
//! execution or resource reservation occurs.

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
use aecp_core::FailureCode;
use aecp_core::FilesystemPermissions;
use aecp_core::PrincipalId;
use aecp_core::SandboxId;
use aecp_core::SandboxPermissions;
use aecp_core::TaskId;
use aecp_core::Timestamp;
use aecp_core::ToolId;
use aecp_core::WorkflowId;
use aecp_execution::InMemoryOutbox;
use aecp_plane::ControlPlane;
use aecp_plane::PlaneConfig;
use aecp_sandbox::AutoDenyEscalationHandler;
use aecp_sandbox::SimulationProvider;
use aecp_telemetry::NullTelemetrySink;

#[test]
fn denied_read_of_an_excluded_path_fails_closed_with_no_execution() {
    let plane = ControlPlane::new(
        PlaneConfig::default(),
        Arc::new(InMemoryOutbox::default()),
        Box::new(InMemoryAuditLog::default()),
        Box::new(InMemorySnapshotStore::default()),
        Arc::new(NullTelemetrySink),
        Arc::new(AutoDenyEscalationHandler),
        Timestamp::from_unix_millis(0),
    )
    .expect("plane");

    let permissions = SandboxPermissions {
        filesystem: FilesystemPermissions { denied_paths: vec!["/etc".to_string()], ..FilesystemPermissions::default() },
        ..SandboxPermissions::default()
    };

    let sandbox = plane.new_sandbox(
        SandboxId::new("sb1"),
        WorkflowId::new("w1"),
        TaskId::new("t1"),
        PrincipalId::new("agent-1"),
        permissions,
        Box::new(SimulationProvider::new()),
    );

    let failure = sandbox.check_filesystem_read(ToolId::new("file.read"), "/etc/passwd").expect_err("must be denied");
    assert_eq!(failure.code, FailureCode::PolicyViolation);

    let audit = plane.audit();
    let entries = audit.query(&aecp_audit::AuditQuery::default());
    assert_eq!(entries.len(), 3, "sandbox_created, a denied permission_check, then a denied escalation_requested");
    assert_eq!(entries[0].action_name, "sandbox_created");

    assert_eq!(entries[1].action_name, "permission_check");
    assert_eq!(entries[1].state_after.as_ref().and_then(|v| v["granted"].as_bool()), Some(false));

    assert_eq!(entries[2].action_name, "escalation_requested");
    assert_eq!(entries[2].state_after.as_ref().and_then(|v| v["granted"].as_bool()), Some(false));
}
