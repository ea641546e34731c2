// crates/aecp-audit/src/retention.rs
// ============================================================================
// Module: Retention Tier Manager
// Description: Age/access-driven tier transitions and compaction for
//              long-lived memory entries.
// Purpose: Keep unbounded memory growth bounded without discarding
//          provenance.
// Dependencies: aecp-core
// ============================================================================

//! ## Overview
//! Implements `spec.md` §4.6's retention tier manager: `evaluate(entry) →
//! {keep | transition(target_tier)}` driven by age and access count, and
//! `compact(entries, strategy)` producing a single `snapshot`-typed summary
//! entry referencing the originals. "High access count (≥ configurable
//! threshold) holds an entry in its current tier irrespective of age."

use aecp_core::MemoryEntry;
use aecp_core::MemoryEntryId;
use aecp_core::MemoryType;
use aecp_core::Provenance;
use aecp_core::RetentionTier;
use aecp_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

/// The outcome of evaluating one entry against the retention policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionDecision {
    /// The entry stays in its current tier.
    Keep,
    /// The entry should move to the named tier.
    Transition(RetentionTier),
}

/// Age and access-count thresholds driving tier transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionThresholds {
    /// Age at or beyond which a `Hot` entry transitions to `Warm`.
    pub warm_after_ms: i64,
    /// Age at or beyond which a `Warm` entry transitions to `Cold`.
    pub cold_after_ms: i64,
    /// Age at or beyond which a `Cold` entry transitions to `Archived`.
    pub archive_after_ms: i64,
    /// Access count at or above which an entry holds its current tier
    /// regardless of age.
    pub high_access_count: u64,
}

impl Default for RetentionThresholds {
    fn default() -> Self {
        Self {
            warm_after_ms: 3_600_000,
            cold_after_ms: 86_400_000,
            archive_after_ms: 2_592_000_000,
            high_access_count: 20,
        }
    }
}

/// Evaluates age/access-driven transitions for memory entries.
pub struct RetentionTierManager {
    thresholds: RetentionThresholds,
}

impl RetentionTierManager {
    /// Creates a manager with the given thresholds.
    #[must_use]
    pub const fn new(thresholds: RetentionThresholds) -> Self {
        Self { thresholds }
    }

    fn tier_for_age(&self, age_ms: i64) -> RetentionTier {
        if age_ms >= self.thresholds.archive_after_ms {
            RetentionTier::Archived
        } else if age_ms >= self.thresholds.cold_after_ms {
            RetentionTier::Cold
        } else if age_ms >= self.thresholds.warm_after_ms {
            RetentionTier::Warm
        } else {
            RetentionTier::Hot
        }
    }

    /// Evaluates one entry against the policy.
    #[must_use]
    pub fn evaluate(&self, entry: &MemoryEntry, now: Timestamp) -> RetentionDecision {
        if entry.access_count >= self.thresholds.high_access_count {
            return RetentionDecision::Keep;
        }
        let age_ms = now.millis_since(entry.created_at);
        let target = self.tier_for_age(age_ms);
        if target == entry.retention_tier {
            RetentionDecision::Keep
        } else {
            RetentionDecision::Transition(target)
        }
    }
}

/// Compaction strategies for collapsing multiple memory entries into one
/// summary entry.
#[derive(Debug, Clone)]
pub enum CompactionStrategy {
    /// Keep only the first `max_chars` characters of each entry's
    /// stringified content, concatenated.
    Truncate {
        /// Maximum characters retained per entry.
        max_chars: usize,
    },
    /// Keep only the named top-level keys from each entry's content, if it
    /// is a JSON object.
    ExtractKey {
        /// Keys to retain.
        keys: Vec<String>,
    },
    /// Produce a placeholder summary carrying entry ids and tags only; a
    /// real semantic summarizer is an external concern this strategy names
    /// a slot for.
    Semantic,
    /// Aggregate numeric fields present across every entry's content (sum
    /// per field name).
    Aggregate,
}

fn truncate_content(entries: &[MemoryEntry], max_chars: usize) -> Value {
    let pieces: Vec<Value> = entries
        .iter()
        .map(|entry| {
            let rendered = entry.content.to_string();
            let truncated: String = rendered.chars().take(max_chars).collect();
            json!({"id": entry.id.as_str(), "excerpt": truncated})
        })
        .collect();
    Value::Array(pieces)
}

fn extract_keys(entries: &[MemoryEntry], keys: &[String]) -> Value {
    let pieces: Vec<Value> = entries
        .iter()
        .map(|entry| {
            let mut extracted = serde_json::Map::new();
            if let Some(object) = entry.content.as_object() {
                for key in keys {
                    if let Some(value) = object.get(key) {
                        extracted.insert(key.clone(), value.clone());
                    }
                }
            }
            json!({"id": entry.id.as_str(), "fields": extracted})
        })
        .collect();
    Value::Array(pieces)
}

fn semantic_placeholder(entries: &[MemoryEntry]) -> Value {
    let summaries: Vec<Value> = entries
        .iter()
        .map(|entry| json!({"id": entry.id.as_str(), "tags": entry.tags.iter().collect::<Vec<_>>()}))
        .collect();
    json!({"summarized_entries": summaries})
}

fn aggregate_numeric_fields(entries: &[MemoryEntry]) -> Value {
    let mut totals = serde_json::Map::new();
    for entry in entries {
        if let Some(object) = entry.content.as_object() {
            for (key, value) in object {
                if let Some(number) = value.as_f64() {
                    let current = totals.get(key).and_then(Value::as_f64).unwrap_or(0.0);
                    totals.insert(key.clone(), json!(current + number));
                }
            }
        }
    }
    Value::Object(totals)
}

/// Collapses `entries` into one `snapshot`-typed summary entry per
/// `strategy`, referencing the originals by id.
#[must_use]
pub fn compact(entries: &[MemoryEntry], strategy: &CompactionStrategy, summary_id: MemoryEntryId, now: Timestamp) -> MemoryEntry {
    let content = match strategy {
        CompactionStrategy::Truncate { max_chars } => truncate_content(entries, *max_chars),
        CompactionStrategy::ExtractKey { keys } => extract_keys(entries, keys),
        CompactionStrategy::Semantic => semantic_placeholder(entries),
        CompactionStrategy::Aggregate => aggregate_numeric_fields(entries),
    };

    let mut tags = std::collections::BTreeSet::new();
    for entry in entries {
        tags.extend(entry.tags.iter().cloned());
    }

    let mut metadata = std::collections::BTreeMap::new();
    metadata.insert(
        "source_ids".to_string(),
        Value::Array(entries.iter().map(|entry| Value::String(entry.id.as_str().to_string())).collect()),
    );

    MemoryEntry {
        id: summary_id,
        content,
        entry_type: MemoryType::Snapshot,
        provenance: Provenance::default(),
        tags,
        metadata,
        retention_tier: RetentionTier::Archived,
        created_at: now,
        last_accessed_at: now,
        access_count: 0,
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
    use aecp_core::MemoryEntry;
    use aecp_core::MemoryEntryId;
    use aecp_core::MemoryType;
    use aecp_core::Provenance;
    use aecp_core::RetentionTier;
    use aecp_core::Timestamp;
    use serde_json::json;

    use super::CompactionStrategy;
    use super::RetentionDecision;
    use super::RetentionThresholds;
    use super::RetentionTierManager;
    use super::compact;

    fn entry(id: &str, age_ms: i64, access_count: u64, tier: RetentionTier) -> MemoryEntry {
        MemoryEntry {
            id: MemoryEntryId::new(id),
            content: json!({"note": "hello"}),
            entry_type: MemoryType::EpisodicNote,
            provenance: Provenance::default(),
            tags: std::collections::BTreeSet::new(),
            metadata: std::collections::BTreeMap::new(),
            retention_tier: tier,
            created_at: Timestamp::from_unix_millis(0),
            last_accessed_at: Timestamp::from_unix_millis(age_ms),
            access_count,
        }
    }

    #[test]
    fn aged_hot_entry_transitions_to_warm() {
        let manager = RetentionTierManager::new(RetentionThresholds { warm_after_ms: 1_000, ..RetentionThresholds::default() });
        let entry = entry("m1", 0, 0, RetentionTier::Hot);
        let decision = manager.evaluate(&entry, Timestamp::from_unix_millis(2_000));
        assert_eq!(decision, RetentionDecision::Transition(RetentionTier::Warm));
    }

    #[test]
    fn high_access_count_holds_tier_regardless_of_age() {
        let manager = RetentionTierManager::new(RetentionThresholds { warm_after_ms: 1_000, high_access_count: 5, ..RetentionThresholds::default() });
        let entry = entry("m1", 0, 10, RetentionTier::Hot);
        let decision = manager.evaluate(&entry, Timestamp::from_unix_millis(999_999));
        assert_eq!(decision, RetentionDecision::Keep);
    }

    #[test]
    fn compaction_produces_snapshot_typed_entry_referencing_originals() {
        let entries = vec![entry("m1", 0, 0, RetentionTier::Cold), entry("m2", 0, 0, RetentionTier::Cold)];
        let summary = compact(&entries, &CompactionStrategy::Truncate { max_chars: 5 }, MemoryEntryId::new("summary-1"), Timestamp::from_unix_millis(100));
        assert_eq!(summary.entry_type, MemoryType::Snapshot);
        assert_eq!(summary.metadata["source_ids"], json!(["m1", "m2"]));
    }
}
