// crates/aecp-plane/src/lib.rs
// ============================================================================
// Module: Agentic Execution Control Plane
// Description: Public API surface for the top-level facade wiring policy,
//              effort, sandbox, execution, audit, and telemetry together.
// Purpose: The crate a caller depends on to mediate every side-effecting
//          action an autonomous agent attempts.
// Dependencies: crate::{config, bridge, plane}
// ============================================================================

//! ## Overview
//! `aecp-plane` implements `spec.md`'s top-level control plane: one
//! explicitly-constructed [`ControlPlane`], built from a [`PlaneConfig`]
//! plus the storage, telemetry, and escalation collaborators a deployment
//! supplies, with sandbox acquisition scoped to one invocation at a time.
//! There is no global or singleton state anywhere in this crate graph —
//! every [`ControlPlane`] a caller builds is independent.

pub mod bridge;
pub mod config;
pub mod plane;

pub use bridge::ChainAuditBridge;
pub use config::ConfigError;
pub use config::PlaneConfig;
pub use plane::ControlPlane;
pub use plane::PlaneError;
