// crates/aecp-sandbox/src/provider.rs
// ============================================================================
// Module: Sandbox Providers
// Description: The simulation and concrete sandbox execution providers.
// Purpose: Perform (or, for dry-runs, merely record) the side effects of a
//          tool invocation and report measured resource usage.
// Dependencies: crate::resource, serde_json
// ============================================================================

//! ## Overview
//! Implements `spec.md` §4.4's two minimal provider implementations: a
//! simulation provider that captures intended side effects without
//! performing them (useful for dry-runs; resource usage reported is
//! always zero), and a concrete provider that performs the effect and
//! measures it. Both implement [`SandboxProvider`] so the tool execution
//! wrapper (`aecp-execution`) is provider-agnostic.

use std::sync::Mutex;
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;

use crate::resource::ResourceUsage;

/// A single tool invocation handed to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Tool identifier being invoked.
    pub tool_id: String,
    /// Arguments to the tool.
    pub args: Value,
}

/// The result of a provider executing (or simulating) a tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    /// The tool's output payload.
    pub output: Value,
    /// Resource usage measured (or, for simulation, zeroed) during
    /// execution.
    pub usage: ResourceUsage,
}

/// Errors a provider can raise while executing a tool invocation.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The underlying executor returned an error.
    #[error("tool {tool_id} failed: {message}")]
    ExecutionFailed {
        /// The tool that failed.
        tool_id: String,
        /// The error message.
        message: String,
    },
    /// Execution exceeded its deadline and was cancelled.
    #[error("tool {tool_id} timed out after {elapsed_ms}ms")]
    Timeout {
        /// The tool that timed out.
        tool_id: String,
        /// Elapsed milliseconds before cancellation.
        elapsed_ms: u64,
    },
}

/// A sandbox execution provider: performs (or simulates) tool invocations.
///
/// # Invariants
/// - `destroy` is idempotent: calling it more than once has no additional
///   effect (`spec.md` §5: "Providers must implement destroy/close
///   idempotently").
pub trait SandboxProvider: Send + Sync {
    /// Executes (or simulates) `invocation`.
    ///
    /// # Errors
    /// Returns [`ProviderError`] on execution failure or timeout.
    fn execute(&self, invocation: &ToolInvocation) -> Result<ToolOutcome, ProviderError>;

    /// Releases any resources held by the provider. Safe to call more than
    /// once.
    fn destroy(&self);
}

/// A provider that records intended side effects without performing them.
/// Resource usage reported is always zero (`spec.md` §4.4: "Resource usage
/// reported by simulation is zero").
#[derive(Default)]
pub struct SimulationProvider {
    captured: Mutex<Vec<ToolInvocation>>,
    destroyed: Mutex<bool>,
}

impl SimulationProvider {
    /// Creates a new, empty simulation provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every invocation captured so far, in call order.
    ///
    /// # Panics
    /// Panics only if the internal lock is poisoned by a prior panic in
    /// another thread, which would indicate a bug elsewhere in the
    /// process.
    #[must_use]
    pub fn captured_invocations(&self) -> Vec<ToolInvocation> {
        self.captured.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl SandboxProvider for SimulationProvider {
    fn execute(&self, invocation: &ToolInvocation) -> Result<ToolOutcome, ProviderError> {
        self.captured
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(invocation.clone());
        Ok(ToolOutcome {
            output: serde_json::json!({"simulated": true, "tool_id": invocation.tool_id}),
            usage: ResourceUsage::default(),
        })
    }

    fn destroy(&self) {
        *self.destroyed.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = true;
    }
}

/// A provider that performs the effect via a caller-supplied executor
/// function and measures wall-clock time actually spent.
pub struct ConcreteProvider {
    executor: Box<dyn Fn(&ToolInvocation) -> Result<Value, String> + Send + Sync>,
    destroyed: Mutex<bool>,
}

impl ConcreteProvider {
    /// Creates a new concrete provider backed by `executor`.
    pub fn new(executor: impl Fn(&ToolInvocation) -> Result<Value, String> + Send + Sync + 'static) -> Self {
        Self {
            executor: Box::new(executor),
            destroyed: Mutex::new(false),
        }
    }
}

impl SandboxProvider for ConcreteProvider {
    fn execute(&self, invocation: &ToolInvocation) -> Result<ToolOutcome, ProviderError> {
        let started = Instant::now();
        let output = (self.executor)(invocation).map_err(|message| ProviderError::ExecutionFailed {
            tool_id: invocation.tool_id.clone(),
            message,
        })?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(ToolOutcome {
            output,
            usage: ResourceUsage {
                cpu_units: 0,
                memory_bytes: 0,
                wall_time_ms: elapsed_ms,
                process_count: 0,
            },
        })
    }

    fn destroy(&self) {
        *self.destroyed.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = true;
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
    use serde_json::Value;
    use serde_json::json;

    use super::ConcreteProvider;
    use super::ResourceUsage;
    use super::SandboxProvider;
    use super::SimulationProvider;
    use super::ToolInvocation;

    #[test]
    fn simulation_provider_reports_zero_usage_and_captures_call() {
        let provider = SimulationProvider::new();
        let invocation = ToolInvocation {
            tool_id: "write_file".to_string(),
            args: json!({"path": "/tmp/a.txt"}),
        };
        let outcome = provider.execute(&invocation).expect("execute");
        assert_eq!(outcome.usage, ResourceUsage::default());
        assert_eq!(provider.captured_invocations(), vec![invocation]);
        provider.destroy();
        provider.destroy(); // idempotent
    }

    #[test]
    fn concrete_provider_runs_executor_and_measures_time() {
        let provider = ConcreteProvider::new(|invocation| Ok(json!({"echo": invocation.tool_id})));
        let invocation = ToolInvocation {
            tool_id: "echo".to_string(),
            args: Value::Null,
        };
        let outcome = provider.execute(&invocation).expect("execute");
        assert_eq!(outcome.output, json!({"echo": "echo"}));
    }

    #[test]
    fn concrete_provider_propagates_executor_error() {
        let provider = ConcreteProvider::new(|_| Err("boom".to_string()));
        let invocation = ToolInvocation {
            tool_id: "broken".to_string(),
            args: Value::Null,
        };
        assert!(provider.execute(&invocation).is_err());
    }
}
