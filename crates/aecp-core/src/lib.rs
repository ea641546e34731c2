// crates/aecp-core/src/lib.rs
// ============================================================================
// Module: Control Plane Core Library
// Description: Public API surface for the control-plane data model.
// Purpose: Expose identifiers, entities, canonical hashing, and the shared
//          failure taxonomy used by every other crate in the workspace.
// Dependencies: crate::{ids, time, model, hashing, taxonomy}
// ============================================================================

//! ## Overview
//! `aecp-core` defines the data model the rest of the control plane operates
//! on: commits, validation and gate results, principals and actions, tool
//! specs, sandbox permissions, audit entries, snapshots, memory entries, and
//! outbox entries. It also owns canonical JSON encoding and content hashing,
//! since every downstream crate needs the same deterministic digest.

pub mod hashing;
pub mod ids;
pub mod model;
pub mod taxonomy;
pub mod time;

pub use hashing::HashError;
pub use hashing::canonical_json_bytes;
pub use hashing::content_hash;
pub use ids::ActionId;
pub use ids::CommitId;
pub use ids::MemoryEntryId;
pub use ids::PrincipalId;
pub use ids::SandboxId;
pub use ids::SnapshotId;
pub use ids::SourceEventId;
pub use ids::StepId;
pub use ids::TaskId;
pub use ids::ToolId;
pub use ids::WorkflowId;
pub use model::*;
pub use taxonomy::FailureCode;
pub use taxonomy::remediation_for;
pub use time::Timestamp;
