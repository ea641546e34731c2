// crates/aecp-plane/tests/s6_tamper_detection.rs
// ============================================================================
// Scenario S6 — Tamper detection on audit load (`spec.md` §8).
// ============================================================================
//! Three audit entries are persisted, then one field of the first entry is
//! mutated out of band. Reloading the persisted log (either directly via
//! `AuditChain::new` or through `ControlPlane::new`) fails with an
//! integrity violation, and the plane never comes up to accept new
//! commits.

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
use std::sync::Mutex;

use aecp_audit::AuditChain;
use aecp_audit::AuditLogPersistence;
use aecp_audit::AuditQuery;
use aecp_audit::ChainError;
use aecp_audit::InMemoryAuditLog;
use aecp_audit::InMemorySnapshotStore;
use aecp_core::AuditEntry;
use aecp_core::Provenance;
use aecp_core::Timestamp;
use aecp_execution::InMemoryOutbox;
use aecp_plane::ControlPlane;
use aecp_plane::PlaneConfig;
use aecp_plane::PlaneError;
use aecp_sandbox::AutoDenyEscalationHandler;
use aecp_telemetry::NullTelemetrySink;
use serde_json::json;

/// Replays a fixed, possibly-tampered set of entries on `load_all`,
/// standing in for a persistence backend whose on-disk rows were edited
/// out of band between process runs.
#[derive(Default)]
struct FrozenAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditLogPersistence for FrozenAuditLog {
    fn append(&self, entry: AuditEntry) -> Result<(), ChainError> {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(entry);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<AuditEntry>, ChainError> {
        Ok(self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone())
    }
}

fn tampered_entries() -> Vec<AuditEntry> {
    let chain = AuditChain::new(Box::new(InMemoryAuditLog::default())).expect("fresh chain");
    for i in 0..3u64 {
        chain
            .append(
                format!("entry-{i}"),
                Timestamp::from_unix_millis(i64::try_from(1_000 * (i + 1)).unwrap_or(i64::MAX)),
                "agent-1",
                "tool_call",
                None,
                Some(json!({"n": i})),
                None,
                Provenance::default(),
            )
            .expect("append");
    }
    let mut entries = chain.query(&AuditQuery::default());
    assert_eq!(entries.len(), 3);

    // Mutate a field of the first entry out of band without recomputing
    // its content hash, simulating a tampered row on disk.
    entries[0].state_after = Some(json!({"n": 999}));
    entries
}

#[test]
fn reloading_a_tampered_log_fails_integrity_verification() {
    let persistence = FrozenAuditLog { entries: Mutex::new(tampered_entries()) };
    let result = AuditChain::new(Box::new(persistence));
    match result {
        Err(ChainError::IntegrityViolation { sequence, .. }) => assert_eq!(sequence, 0),
        other => panic!("expected an integrity violation, got {other:?}"),
    }
}

#[test]
fn the_plane_refuses_to_start_over_a_tampered_audit_log() {
    let persistence = FrozenAuditLog { entries: Mutex::new(tampered_entries()) };
    let result = ControlPlane::new(
        PlaneConfig::default(),
        Arc::new(InMemoryOutbox::default()),
        Box::new(persistence),
        Box::new(InMemorySnapshotStore::default()),
        Arc::new(NullTelemetrySink),
        Arc::new(AutoDenyEscalationHandler),
        Timestamp::from_unix_millis(0),
    );

    match result {
        Err(PlaneError::Audit(ChainError::IntegrityViolation { .. })) => {}
        other => panic!("expected the plane to refuse construction over a tampered log, got {}", other.is_err()),
    }
}
