// crates/aecp-execution/src/outbox.rs
// ============================================================================
// Module: Outbox
// Description: The execute-once authority for side-effecting tool calls.
// Purpose: Hold one entry per idempotency key and arbitrate whether a
//          given invocation replays a prior result or re-executes.
// Dependencies: aecp-core, std::sync
// ============================================================================

//! ## Overview
//! Implements `spec.md` §4.5 and §5: "the outbox is the authority on
//! side-effect occurrence... inserts are conditional on absence of a
//! committed entry for the key". A `committed` entry is replayed verbatim;
//! `pending` or `failed` entries are retried. The reference implementation
//! here is in-memory; a durable implementation binds the same
//! [`OutboxStore`] trait to a row store keyed by idempotency key, per
//! `spec.md` §6's persisted-layout note.

use std::collections::HashMap;
use std::sync::Mutex;

use aecp_core::OutboxEntry;
use aecp_core::OutboxState;
use serde_json::Value;

/// What the caller should do for a given idempotency key.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboxDecision {
    /// A committed result exists; return it marked as replayed.
    Replay(Value),
    /// No committed entry exists; proceed to execute. The entry has been
    /// inserted (or already existed) in `pending` state.
    Execute,
}

/// The outbox's storage contract (`spec.md` §6: "Outbox service contract").
pub trait OutboxStore: Send + Sync {
    /// Looks up the entry for `key`, if any.
    fn get(&self, key: &str) -> Option<OutboxEntry>;

    /// Begins (or resumes) an attempt for `key`: if a `committed` entry
    /// exists, returns [`OutboxDecision::Replay`]; otherwise marks the
    /// entry `pending` (inserting it if absent) and returns
    /// [`OutboxDecision::Execute`].
    fn begin(&self, key: &str) -> OutboxDecision;

    /// Marks `key` as `committed` with the given result.
    fn commit(&self, key: &str, result: Value);

    /// Marks `key` as `failed`, preserving the key for a future retry.
    fn fail(&self, key: &str);
}

/// An in-memory outbox, the reference implementation used in tests and
/// for standalone use.
#[derive(Default)]
pub struct InMemoryOutbox {
    entries: Mutex<HashMap<String, OutboxEntry>>,
}

impl InMemoryOutbox {
    /// Creates a new, empty in-memory outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutboxStore for InMemoryOutbox {
    fn get(&self, key: &str) -> Option<OutboxEntry> {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).get(key).cloned()
    }

    fn begin(&self, key: &str) -> OutboxDecision {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match entries.get_mut(key) {
            Some(entry) if entry.state == OutboxState::Committed => {
                OutboxDecision::Replay(entry.result.clone().unwrap_or(Value::Null))
            }
            Some(entry) => {
                entry.state = OutboxState::Pending;
                entry.attempt_count += 1;
                OutboxDecision::Execute
            }
            None => {
                entries.insert(
                    key.to_string(),
                    OutboxEntry {
                        idempotency_key: key.to_string(),
                        state: OutboxState::Pending,
                        result: None,
                        attempt_count: 1,
                    },
                );
                OutboxDecision::Execute
            }
        }
    }

    fn commit(&self, key: &str, result: Value) {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries
            .entry(key.to_string())
            .and_modify(|entry| {
                entry.state = OutboxState::Committed;
                entry.result = Some(result.clone());
            })
            .or_insert(OutboxEntry {
                idempotency_key: key.to_string(),
                state: OutboxState::Committed,
                result: Some(result),
                attempt_count: 1,
            });
    }

    fn fail(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(key) {
            entry.state = OutboxState::Failed;
        }
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

    use super::InMemoryOutbox;
    use super::OutboxDecision;
    use super::OutboxStore;

    #[test]
    fn first_begin_executes_second_replays_after_commit() {
        let outbox = InMemoryOutbox::new();
        assert_eq!(outbox.begin("k1"), OutboxDecision::Execute);
        outbox.commit("k1", json!({"ok": true}));
        assert_eq!(outbox.begin("k1"), OutboxDecision::Replay(json!({"ok": true})));
    }

    #[test]
    fn failed_entry_is_retried_not_replayed() {
        let outbox = InMemoryOutbox::new();
        assert_eq!(outbox.begin("k2"), OutboxDecision::Execute);
        outbox.fail("k2");
        assert_eq!(outbox.begin("k2"), OutboxDecision::Execute);
        assert_eq!(outbox.get("k2").expect("entry").attempt_count, 2);
    }
}
