// crates/aecp-core/src/ids.rs
// ============================================================================
// Module: Control Plane Identifiers
// Description: Canonical opaque identifiers used throughout the plane.
// Purpose: Provide strongly typed, serializable identifiers with stable wire
//          forms so callers can never confuse a workflow id for a task id.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every identifier in the plane is an opaque newtype over `String` rather
//! than a raw string, so the compiler rejects passing a `TaskId` where a
//! `StepId` is expected. Identifiers carry no normalization or validation
//! beyond non-emptiness; callers are responsible for uniqueness.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

macro_rules! opaque_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new ", stringify!($name), " from any string-like value.")]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

opaque_id!(CommitId, "Identifier for a commit entering the plane.");
opaque_id!(PrincipalId, "Identifier for a principal (agent / user / service).");
opaque_id!(ActionId, "Identifier for a policy-visible action.");
opaque_id!(ToolId, "Identifier for a tool specification.");
opaque_id!(SandboxId, "Identifier for a sandbox instance.");
opaque_id!(WorkflowId, "Identifier for a workflow.");
opaque_id!(TaskId, "Identifier for a task within a workflow.");
opaque_id!(StepId, "Identifier for a step within a task.");
opaque_id!(SourceEventId, "Identifier for the upstream event that triggered a commit.");
opaque_id!(SnapshotId, "Identifier for a state snapshot.");
opaque_id!(MemoryEntryId, "Identifier for a long-lived memory entry.");
