// crates/aecp-telemetry/src/sink.rs
// ============================================================================
// Module: Telemetry Sink
// Description: Event and metric types emitted by every suspension point,
//              plus the tracing-backed and no-op sink implementations.
// Purpose: Give callers a pluggable observability seam without coupling
//          the core crates to any one exporter.
// Dependencies: aecp-audit (redaction), tracing
// ============================================================================

//! ## Overview
//! Implements `spec.md` §6's telemetry sink contract: events carry
//! `{type, workflow_id, task_id, timestamp, data}`, metrics carry
//! `{name, value, labels}`. "All arguments/results pass through the
//! redaction filter before emission" — [`TelemetrySink::emit_event`]
//! redacts `data` before handing it to the sink implementation, so no
//! implementor can forget the step.

use std::collections::BTreeMap;

use aecp_audit::default_sensitive_fields;
use aecp_audit::redact;
use aecp_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// The fixed set of telemetry event kinds named by `spec.md` §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A tool invocation was attempted.
    ToolCall,
    /// A validation pipeline produced a result.
    CrvResult,
    /// A policy gate check ran.
    PolicyCheck,
    /// A sandbox was created.
    SandboxCreated,
    /// A sandbox was destroyed.
    SandboxDestroyed,
    /// A permission check ran.
    PermissionCheck,
    /// An escalation was requested.
    EscalationRequested,
}

/// One telemetry event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// What kind of event this is.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// The workflow this event belongs to.
    pub workflow_id: String,
    /// The task this event belongs to.
    pub task_id: String,
    /// When the event occurred.
    pub timestamp: Timestamp,
    /// Event-specific payload, redacted before emission.
    pub data: Value,
}

/// One telemetry metric observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryMetric {
    /// Metric name.
    pub name: String,
    /// Observed value.
    pub value: f64,
    /// Dimension labels.
    pub labels: BTreeMap<String, String>,
}

/// The telemetry sink contract (`spec.md` §6). Implementations receive
/// already-redacted event data via [`TelemetrySink::emit_event`]'s default
/// method; only [`TelemetrySink::write_event`] and
/// [`TelemetrySink::write_metric`] need implementing.
pub trait TelemetrySink: Send + Sync {
    /// Writes an event whose `data` has already passed through redaction.
    fn write_event(&self, event: TelemetryEvent);

    /// Writes a metric observation.
    fn write_metric(&self, metric: TelemetryMetric);

    /// Redacts `event.data` and forwards to [`TelemetrySink::write_event`].
    /// Call this, not `write_event` directly, from instrumented code.
    fn emit_event(&self, mut event: TelemetryEvent) {
        event.data = redact(&event.data, &default_sensitive_fields());
        self.write_event(event);
    }
}

/// Forwards redacted events and metrics to the `tracing` crate as
/// structured fields, per `spec.md` §9's note that observability stays
/// wired even when outer exporters are out of scope.
#[derive(Debug, Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn write_event(&self, event: TelemetryEvent) {
        tracing::info!(
            event_type = ?event.kind,
            workflow_id = %event.workflow_id,
            task_id = %event.task_id,
            timestamp_ms = event.timestamp.unix_millis(),
            data = %event.data,
            "telemetry event"
        );
    }

    fn write_metric(&self, metric: TelemetryMetric) {
        tracing::info!(
            metric_name = %metric.name,
            metric_value = metric.value,
            metric_labels = ?metric.labels,
            "telemetry metric"
        );
    }
}

/// Discards every event and metric. Used in tests and as the safe
/// default when no exporter is wired.
#[derive(Debug, Default)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {
    fn write_event(&self, _event: TelemetryEvent) {}

    fn write_metric(&self, _metric: TelemetryMetric) {}
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
    use std::sync::Mutex;

    use serde_json::Value;
    use serde_json::json;

    use super::EventKind;
    use super::NullTelemetrySink;
    use super::TelemetryEvent;
    use super::TelemetryMetric;
    use super::TelemetrySink;
    use aecp_core::Timestamp;

    #[derive(Default)]
    struct CapturingSink {
        events: Mutex<Vec<TelemetryEvent>>,
    }

    impl TelemetrySink for CapturingSink {
        fn write_event(&self, event: TelemetryEvent) {
            self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(event);
        }

        fn write_metric(&self, _metric: TelemetryMetric) {}
    }

    fn event(data: Value) -> TelemetryEvent {
        TelemetryEvent { kind: EventKind::ToolCall, workflow_id: "w1".to_string(), task_id: "t1".to_string(), timestamp: Timestamp::from_unix_millis(1), data }
    }

    #[test]
    fn emit_event_redacts_sensitive_fields_before_writing() {
        let sink = CapturingSink::default();
        sink.emit_event(event(json!({"api_key": "secret-value", "tool": "http"})));
        let captured = sink.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        assert_eq!(captured[0].data["api_key"], json!("***REDACTED***"));
        assert_eq!(captured[0].data["tool"], json!("http"));
    }

    #[test]
    fn null_sink_accepts_events_without_panicking() {
        let sink = NullTelemetrySink;
        sink.emit_event(event(json!({"ok": true})));
        sink.write_metric(TelemetryMetric { name: "latency_ms".to_string(), value: 12.0, labels: std::collections::BTreeMap::new() });
    }
}
