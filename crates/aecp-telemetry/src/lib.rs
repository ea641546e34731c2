// crates/aecp-telemetry/src/lib.rs
// ============================================================================
// Module: Control Plane Integration Bridge
// Description: Public API surface for the telemetry sink, escalation
//              handler facade, and recovery executor contracts.
// Purpose: Give the plane a single crate for the "outer" contracts named
//          by spec.md §6, all redaction-aware and pluggable.
// Dependencies: crate::{sink, escalation, recovery}
// ============================================================================

//! ## Overview
//! `aecp-telemetry` implements `spec.md` §6's integration bridge: the
//! telemetry sink contract (events and metrics, redacted before
//! emission), a re-export of the escalation handler contract owned by
//! `aecp-sandbox`, and the recovery executor contract for the three
//! externally-driven recovery strategies named in §4.1.

pub mod escalation;
pub mod recovery;
pub mod sink;

pub use escalation::AutoDenyEscalationHandler;
pub use escalation::EscalationDecision;
pub use escalation::EscalationHandler;
pub use escalation::EscalationRequest;
pub use recovery::FailureContext;
pub use recovery::NoopRecoveryExecutor;
pub use recovery::RecoveryExecutor;
pub use recovery::RecoveryOutcome;
pub use recovery::RecoveryStrategy;
pub use recovery::apply_recovery;
pub use sink::EventKind;
pub use sink::NullTelemetrySink;
pub use sink::TelemetryEvent;
pub use sink::TelemetryMetric;
pub use sink::TelemetrySink;
pub use sink::TracingTelemetrySink;
