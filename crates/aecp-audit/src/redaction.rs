// crates/aecp-audit/src/redaction.rs
// ============================================================================
// Module: Secret Redaction
// Description: Walks a JSON value and replaces sensitive fields with a
//              sentinel before audit or telemetry emission.
// Purpose: Prevent credentials from leaking into the tamper-evident
//          record or observability sinks.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Implements `spec.md` §4.6's provenance and secret redaction: "Any field
//! name matching the configured sensitive-field set... is replaced with a
//! sentinel before being emitted to telemetry or audit," recursing into
//! nested objects and arrays.

use std::collections::BTreeSet;

use serde_json::Value;

/// Sentinel substituted for a redacted field's value.
pub const REDACTED_SENTINEL: &str = "***REDACTED***";

/// The default sensitive-field set named by `spec.md` §4.6.
#[must_use]
pub fn default_sensitive_fields() -> BTreeSet<String> {
    ["password", "token", "access_token", "api_key", "apiKey", "secret", "credentials"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Recursively redacts `value`, replacing the value of any object field
/// whose name appears in `sensitive_fields` with [`REDACTED_SENTINEL`].
#[must_use]
pub fn redact(value: &Value, sensitive_fields: &BTreeSet<String>) -> Value {
    match value {
        Value::Object(map) => {
            let redacted = map
                .iter()
                .map(|(key, inner)| {
                    if sensitive_fields.contains(key) {
                        (key.clone(), Value::String(REDACTED_SENTINEL.to_string()))
                    } else {
                        (key.clone(), redact(inner, sensitive_fields))
                    }
                })
                .collect();
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(|item| redact(item, sensitive_fields)).collect()),
        other => other.clone(),
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
    use serde_json::json;

    use super::default_sensitive_fields;
    use super::redact;

    #[test]
    fn top_level_sensitive_field_is_redacted() {
        let input = json!({"username": "alice", "password": "hunter2"});
        let output = redact(&input, &default_sensitive_fields());
        assert_eq!(output["password"], json!("***REDACTED***"));
        assert_eq!(output["username"], json!("alice"));
    }

    #[test]
    fn nested_sensitive_field_is_redacted() {
        let input = json!({"auth": {"credentials": {"api_key": "abc123"}}});
        let output = redact(&input, &default_sensitive_fields());
        assert_eq!(output["auth"]["credentials"], json!("***REDACTED***"));
    }

    #[test]
    fn sensitive_field_inside_array_elements_is_redacted() {
        let input = json!([{"token": "t1"}, {"token": "t2"}]);
        let output = redact(&input, &default_sensitive_fields());
        assert_eq!(output[0]["token"], json!("***REDACTED***"));
        assert_eq!(output[1]["token"], json!("***REDACTED***"));
    }
}
