// crates/aecp-sandbox/src/resource.rs
// ============================================================================
// Module: Resource Accounting
// Description: Tracks cumulative CPU, memory, wall-time, and process-count
//              usage per sandbox.
// Purpose: Reject requests that would push any counter over its limit.
// Dependencies: aecp-core, std::sync
// ============================================================================

//! ## Overview
//! Implements the accounting half of `spec.md` §4.4: "a request that would
//! push any counter over its limit is rejected". State lives behind a
//! `Mutex` so concurrent tool invocations against the same sandbox see a
//! consistent view (`spec.md` §5: "short critical sections").

use std::sync::Mutex;

use aecp_core::ResourceLimits;

/// A snapshot of cumulative resource usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceUsage {
    /// Cumulative CPU units consumed.
    pub cpu_units: u64,
    /// Cumulative memory bytes allocated at peak.
    pub memory_bytes: u64,
    /// Cumulative wall-clock milliseconds spent executing.
    pub wall_time_ms: u64,
    /// Number of processes spawned.
    pub process_count: u64,
}

/// Thread-safe cumulative resource accounting for a single sandbox.
#[derive(Debug, Default)]
pub struct ResourceAccounting {
    usage: Mutex<ResourceUsage>,
    limits: ResourceLimits,
}

/// Outcome of attempting to reserve additional resource usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// The reservation was accepted and usage updated.
    Accepted,
    /// The reservation would exceed a configured limit; usage is
    /// unchanged.
    Rejected {
        /// The kind of limit that would have been exceeded.
        kind: &'static str,
    },
}

impl ResourceAccounting {
    /// Creates a new accounting tracker under the given limits.
    #[must_use]
    pub const fn new(limits: ResourceLimits) -> Self {
        Self {
            usage: Mutex::new(ResourceUsage {
                cpu_units: 0,
                memory_bytes: 0,
                wall_time_ms: 0,
                process_count: 0,
            }),
            limits,
        }
    }

    /// Returns a snapshot of current cumulative usage.
    #[must_use]
    pub fn snapshot(&self) -> ResourceUsage {
        *self.usage.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Attempts to reserve `delta` additional usage. Rejects (without
    /// mutating state) if any counter would exceed its configured limit.
    pub fn reserve(&self, delta: ResourceUsage) -> ReservationOutcome {
        let mut usage = self.usage.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let projected = ResourceUsage {
            cpu_units: usage.cpu_units + delta.cpu_units,
            memory_bytes: usage.memory_bytes + delta.memory_bytes,
            wall_time_ms: usage.wall_time_ms + delta.wall_time_ms,
            process_count: usage.process_count + delta.process_count,
        };

        if let Some(limit) = self.limits.max_cpu_units {
            if projected.cpu_units > limit {
                return ReservationOutcome::Rejected { kind: "cpu" };
            }
        }
        if let Some(limit) = self.limits.max_memory_bytes {
            if projected.memory_bytes > limit {
                return ReservationOutcome::Rejected { kind: "memory" };
            }
        }
        if let Some(limit) = self.limits.max_execution_time_ms {
            if projected.wall_time_ms > limit {
                return ReservationOutcome::Rejected { kind: "execution_time_ms" };
            }
        }
        if let Some(limit) = self.limits.max_process_count {
            if projected.process_count > limit {
                return ReservationOutcome::Rejected { kind: "process_count" };
            }
        }

        *usage = projected;
        ReservationOutcome::Accepted
    }
}

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
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
    use aecp_core::ResourceLimits;

    use super::ReservationOutcome;
    use super::ResourceAccounting;
    use super::ResourceUsage;

    #[test]
    fn reservation_within_limits_accumulates() {
        let accounting = ResourceAccounting::new(ResourceLimits {
            max_cpu_units: Some(10),
            max_memory_bytes: None,
            max_execution_time_ms: None,
            max_process_count: None,
        });
        assert_eq!(
            accounting.reserve(ResourceUsage { cpu_units: 4, ..Default::default() }),
            ReservationOutcome::Accepted
        );
        assert_eq!(accounting.snapshot().cpu_units, 4);
        assert_eq!(
            accounting.reserve(ResourceUsage { cpu_units: 4, ..Default::default() }),
            ReservationOutcome::Accepted
        );
        assert_eq!(accounting.snapshot().cpu_units, 8);
    }

    #[test]
    fn reservation_over_limit_is_rejected_and_does_not_mutate() {
        let accounting = ResourceAccounting::new(ResourceLimits {
            max_cpu_units: Some(10),
            max_memory_bytes: None,
            max_execution_time_ms: None,
            max_process_count: None,
        });
        accounting.reserve(ResourceUsage { cpu_units: 8, ..Default::default() });
        let outcome = accounting.reserve(ResourceUsage { cpu_units: 5, ..Default::default() });
        assert_eq!(outcome, ReservationOutcome::Rejected { kind: "cpu" });
        assert_eq!(accounting.snapshot().cpu_units, 8);
    }
}
