// crates/aecp-core/src/time.rs
// ============================================================================
// Module: Control Plane Time Model
// Description: Canonical timestamp representation for commits, audit
//              entries, and snapshots.
// Purpose: Provide a deterministic, replayable time value independent of the
//          host clock's epoch representation.
// Dependencies: serde, std::time
// ============================================================================

//! ## Overview
//! The plane never embeds `std::time::SystemTime` directly in persisted
//! data: every data type carries a [`Timestamp`], a thin wrapper over a Unix
//! millisecond count. Callers supply timestamps explicitly (from a context
//! clock); the core never reads wall-clock time itself, keeping evaluation
//! deterministic and replayable.

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

/// A point in time expressed as milliseconds since the Unix epoch.
///
/// # Invariants
/// - No validation is performed; monotonicity across a sequence of
///   timestamps is a caller responsibility (see the audit chain's sequence
///   numbers for the property that actually needs monotonicity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from a raw Unix millisecond count.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the wrapped Unix millisecond count.
    #[must_use]
    pub const fn unix_millis(self) -> i64 {
        self.0
    }

    /// Reads the current wall-clock time. Intended for host/context
    /// construction code, not for use inside validation, policy, or audit
    /// logic (which must receive their timestamp as an explicit argument).
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "millisecond counts fit in i64 until year 292471707"
    )]
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(elapsed.as_millis() as i64)
    }

    /// Returns the duration between `self` and an earlier timestamp, in
    /// milliseconds. Negative if `earlier` is after `self`.
    #[must_use]
    pub const fn millis_since(self, earlier: Self) -> i64 {
        self.0 - earlier.0
    }
}
