// crates/aecp-plane/tests/s4_rollback.rs
// ============================================================================
// Scenario S4 — Rollback to last verified (`spec.md` §8).
// ============================================================================
//! A verified snapshot is created with state `{v: 10}`, then an unverified
//! snapshot with state `{v: 20}`. Calling `rollback_to_last_verified`
//! returns the verified snapshot, and the rollback is itself recorded as
//! an audit entry attributed to `system` without breaking chain integrity.

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
use aecp_core::PrincipalId;
use aecp_core::SnapshotId;
use aecp_core::SnapshotTrigger;
use aecp_core::Timestamp;
use aecp_execution::InMemoryOutbox;
use aecp_plane::ControlPlane;
use aecp_plane::PlaneConfig;
use aecp_sandbox::AutoDenyEscalationHandler;
use aecp_telemetry::NullTelemetrySink;
use serde_json::json;

#[test]
fn rollback_to_last_verified_restores_the_verified_state_and_stays_chain_valid() {
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

    let snapshots = plane.snapshots();

    let verified = snapshots
        .create(
            SnapshotId::new("snap-verified"),
            Timestamp::from_unix_millis(1_000),
            json!({"v": 10}),
            true,
            PrincipalId::new("agent-1"),
            "session-1".to_string(),
            1,
            SnapshotTrigger::Manual,
        )
        .expect("create verified snapshot");
    assert_eq!(verified.state, json!({"v": 10}));

    let _unverified = snapshots
        .create(
            SnapshotId::new("snap-unverified"),
            Timestamp::from_unix_millis(2_000),
            json!({"v": 20}),
            false,
            PrincipalId::new("agent-1"),
            "session-1".to_string(),
            2,
            SnapshotTrigger::Manual,
        )
        .expect("create unverified snapshot");

    let restored = snapshots.rollback_to_last_verified().expect("rollback");
    assert_eq!(restored.state, json!({"v": 10}));
    assert!(restored.verified);

    let audit = plane.audit();
    audit
        .append(
            "rollback-1",
            Timestamp::from_unix_millis(3_000),
            "system",
            "rollback",
            Some(json!({"v": 20})),
            Some(json!({"v": 10})),
            Some(json!({"restored_snapshot": restored.id.as_str()})),
            aecp_core::Provenance::default(),
        )
        .expect("append rollback entry");

    let report = audit.verify_integrity();
    assert!(report.valid, "chain integrity must remain valid across a rollback entry");

    let rollback_entries = audit.query(&aecp_audit::AuditQuery { action_name: Some("rollback"), ..Default::default() });
    assert_eq!(rollback_entries.len(), 1);
    assert_eq!(rollback_entries[0].actor, "system");
}
