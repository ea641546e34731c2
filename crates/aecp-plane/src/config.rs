// crates/aecp-plane/src/config.rs
// ============================================================================
// Module: Plane Configuration
// Description: The deserializable knobs a deployment tunes without
//              recompiling: effort thresholds, sandbox resource caps,
//              retention thresholds, snapshot triggers, and the redaction
//              field list.
// Purpose: A single TOML-shaped source of truth the builder reads before
//          constructing a ControlPlane.
// Dependencies: aecp-core, aecp-effort, aecp-audit, serde, toml
// ============================================================================

//! ## Overview
//! Grounded in `decision-gate-config`'s role as the teacher workspace's
//! dedicated configuration crate: one struct, `serde`-deserializable from
//! TOML, with `Default` filling in every threshold the rest of the plane
//! already defaults to. Unlike the teacher's config crate this one stays
//! scoped to what `ControlPlane::from_config` actually consumes; it does
//! not grow into a general-purpose settings store.

use std::path::Path;

use aecp_audit::RetentionThresholds;
use aecp_audit::SnapshotThresholds;
use aecp_effort::ConstraintWeights;
use aecp_effort::EffortThresholds;
use aecp_core::ResourceLimits;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while loading or parsing a [`PlaneConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the TOML source from disk failed.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// The path that could not be read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The TOML source did not parse into a [`PlaneConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The config could not be serialized back to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// The effort evaluator's tunables (`spec.md` §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffortConfig {
    /// Relative weights for cost/risk/quality.
    pub weights: ConstraintWeights,
    /// Approve/reject thresholds.
    pub thresholds: EffortThresholds,
    /// Latency budget (ms) used to normalize observed latency.
    pub latency_budget_ms: f64,
}

impl Default for EffortConfig {
    fn default() -> Self {
        Self { weights: ConstraintWeights::default(), thresholds: EffortThresholds::default(), latency_budget_ms: 5000.0 }
    }
}

/// Default sandbox resource caps applied when a caller does not supply its
/// own `ResourceLimits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSandboxLimits {
    /// Default CPU-unit cap, if any.
    pub max_cpu_units: Option<u64>,
    /// Default memory cap in bytes, if any.
    pub max_memory_bytes: Option<u64>,
    /// Default wall-clock execution time cap in milliseconds, if any.
    pub max_execution_time_ms: Option<u64>,
    /// Default process-count cap, if any.
    pub max_process_count: Option<u64>,
}

impl Default for DefaultSandboxLimits {
    fn default() -> Self {
        Self {
            max_cpu_units: Some(4),
            max_memory_bytes: Some(512 * 1024 * 1024),
            max_execution_time_ms: Some(30_000),
            max_process_count: Some(8),
        }
    }
}

impl DefaultSandboxLimits {
    /// Converts to the `aecp-core` resource limits type the sandbox
    /// permission envelope carries.
    #[must_use]
    pub const fn to_resource_limits(self) -> ResourceLimits {
        ResourceLimits {
            max_cpu_units: self.max_cpu_units,
            max_memory_bytes: self.max_memory_bytes,
            max_execution_time_ms: self.max_execution_time_ms,
            max_process_count: self.max_process_count,
        }
    }
}

/// The sensitive-field redaction list applied to audit and telemetry
/// payloads (`spec.md` §4.6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Field names redacted wherever they appear in a JSON payload, in
    /// addition to `aecp-audit`'s built-in default list.
    pub extra_sensitive_fields: Vec<String>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self { extra_sensitive_fields: Vec::new() }
    }
}

/// The invocation timeout applied by the tool execution wrapper.
const fn default_invocation_timeout_ms() -> u64 {
    30_000
}

/// Everything a [`crate::plane::ControlPlane`] needs beyond the trait
/// objects a caller supplies directly (storage backend, providers,
/// escalation handler): the numeric policy the gates above it use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneConfig {
    /// Effort evaluator tunables.
    pub effort: EffortConfig,
    /// Default sandbox resource caps.
    pub sandbox_limits: DefaultSandboxLimits,
    /// Retention tier manager thresholds.
    pub retention: RetentionThresholds,
    /// Snapshot manager thresholds.
    pub snapshot: SnapshotThresholds,
    /// Secret redaction configuration.
    pub redaction: RedactionConfig,
    /// Per-invocation wall-clock timeout in milliseconds.
    #[serde(default = "default_invocation_timeout_ms")]
    pub invocation_timeout_ms: u64,
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            effort: EffortConfig::default(),
            sandbox_limits: DefaultSandboxLimits::default(),
            retention: RetentionThresholds::default(),
            snapshot: SnapshotThresholds::default(),
            redaction: RedactionConfig::default(),
            invocation_timeout_ms: default_invocation_timeout_ms(),
        }
    }
}

impl PlaneConfig {
    /// Parses a `PlaneConfig` from a TOML string, falling back to
    /// [`Default`] for any field the source omits.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] if `source` is not valid TOML, or
    /// does not match the `PlaneConfig` shape.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a `PlaneConfig` from a TOML file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if its contents are not valid.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        Self::from_toml_str(&source)
    }

    /// Serializes this config back to a TOML string.
    ///
    /// # Errors
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
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
    use super::PlaneConfig;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = PlaneConfig::default();
        let rendered = config.to_toml_string().unwrap();
        let parsed = PlaneConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn partial_toml_fills_remaining_fields_from_default() {
        let parsed = PlaneConfig::from_toml_str("invocation_timeout_ms = 1000\n").unwrap();
        assert_eq!(parsed.invocation_timeout_ms, 1000);
        assert_eq!(parsed.effort, PlaneConfig::default().effort);
    }

    #[test]
    fn empty_toml_yields_default_config() {
        let parsed = PlaneConfig::from_toml_str("").unwrap();
        assert_eq!(parsed, PlaneConfig::default());
    }
}
