// crates/aecp-audit/src/lib.rs
// ============================================================================
// Module: Control Plane Audit Library
// Description: Public API surface for the hash-chained audit log,
//              snapshot manager, retention tier manager, and redaction.
// Purpose: Expose the tamper-evident record and the memory lifecycle
//          built on top of it.
// Dependencies: crate::{chain, snapshot, retention, redaction}
// ============================================================================

//! ## Overview
//! `aecp-audit` implements `spec.md` §4.6: an append-only, hash-chained
//! audit log; an always-on snapshot manager with verified-only rollback;
//! a retention tier manager with four compaction strategies; and the
//! secret-redaction filter shared by the audit and telemetry paths.

pub mod chain;
pub mod redaction;
pub mod retention;
pub mod snapshot;

pub use chain::AuditChain;
pub use chain::AuditLogPersistence;
pub use chain::AuditQuery;
pub use chain::ChainError;
pub use chain::InMemoryAuditLog;
pub use chain::IntegrityReport;
pub use chain::verify_chain;
pub use redaction::REDACTED_SENTINEL;
pub use redaction::default_sensitive_fields;
pub use redaction::redact;
pub use retention::CompactionStrategy;
pub use retention::RetentionDecision;
pub use retention::RetentionThresholds;
pub use retention::RetentionTierManager;
pub use retention::compact;
pub use snapshot::InMemorySnapshotStore;
pub use snapshot::SnapshotError;
pub use snapshot::SnapshotManager;
pub use snapshot::SnapshotPersistence;
pub use snapshot::SnapshotThresholds;
