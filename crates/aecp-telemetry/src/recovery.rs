// crates/aecp-telemetry/src/recovery.rs
// ============================================================================
// Module: Recovery Executor Facade
// Description: Re-exports the recovery strategy and executor contract so
//              callers assembling the integration bridge need only depend
//              on aecp-telemetry, not aecp-validation directly.
// Purpose: spec.md §6 groups the telemetry sink, escalation handler, and
//          recovery executor contracts as one "integration bridge"; the
//          recovery strategy/executor contract itself is owned by
//          aecp-validation (§4.1), whose pipeline declares the strategy
//          a failed run should apply.
// Dependencies: aecp-validation
// ============================================================================

//! ## Overview
//! The recovery strategy enum, failure context, and executor trait live in
//! `aecp-validation` because the pipeline that declares a recovery
//! strategy (`ValidationPipeline::with_recovery`) is part of the
//! validation crate (`spec.md` §4.1). This module re-exports them so a
//! caller building the integration bridge has one crate to depend on.

pub use aecp_validation::FailureContext;
pub use aecp_validation::NoopRecoveryExecutor;
pub use aecp_validation::RecoveryExecutor;
pub use aecp_validation::RecoveryOutcome;
pub use aecp_validation::RecoveryStrategy;
pub use aecp_validation::apply_recovery;
