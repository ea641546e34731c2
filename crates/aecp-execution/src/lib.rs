// crates/aecp-execution/src/lib.rs
// ============================================================================
// Module: Control Plane Execution Library
// Description: Public API surface for the tool execution wrapper.
// Purpose: Expose idempotency key derivation, the outbox contract, the
//          execution audit hook, and the end-to-end invocation wrapper.
// Dependencies: crate::{idempotency, outbox, audit_hook, wrapper}
// ============================================================================

//! ## Overview
//! `aecp-execution` implements `spec.md` §4.5: the single choke point every
//! side-effecting tool call passes through, wiring idempotency, the
//! outbox, policy, effort, CRV gates, and sandboxed execution into one
//! nine-step flow.

pub mod audit_hook;
pub mod idempotency;
pub mod outbox;
pub mod wrapper;

pub use audit_hook::ExecutionAuditEvent;
pub use audit_hook::ExecutionAuditSink;
pub use audit_hook::NullExecutionAuditSink;
pub use idempotency::idempotency_key;
pub use outbox::InMemoryOutbox;
pub use outbox::OutboxDecision;
pub use outbox::OutboxStore;
pub use wrapper::ExecutionFailure;
pub use wrapper::ExecutionOutcome;
pub use wrapper::InvocationRequest;
pub use wrapper::ToolExecutionWrapper;
