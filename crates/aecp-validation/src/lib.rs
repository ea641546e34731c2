// crates/aecp-validation/src/lib.rs
// ============================================================================
// Module: Control Plane Validation Library
// Description: Public API surface for the CRV (Circuit Reasoning
//              Validation) operator pipeline.
// Purpose: Expose the operator contract, the six standard operators, the
//          pipeline, and recovery strategies.
// Dependencies: crate::{operator, operators, pipeline, recovery}
// ============================================================================

//! ## Overview
//! `aecp-validation` implements `spec.md` §4.1: a pipeline of pure
//! transforms (extract / normalize / compare / verify schema / verify
//! constraints / decide) producing structured [`aecp_core::ValidationResult`]
//! values with a stable failure taxonomy and remediation hints.

pub mod operator;
pub mod operators;
pub mod pipeline;
pub mod recovery;

pub use operator::Operator;
pub use operator::OperatorError;
pub use operator::OperatorValue;
pub use pipeline::StopPolicy;
pub use pipeline::ValidationPipeline;
pub use recovery::FailureContext;
pub use recovery::NoopRecoveryExecutor;
pub use recovery::RecoveryExecutor;
pub use recovery::RecoveryOutcome;
pub use recovery::RecoveryStrategy;
pub use recovery::apply_recovery;
