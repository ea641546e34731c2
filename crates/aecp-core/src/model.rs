// crates/aecp-core/src/model.rs
// ============================================================================
// Module: Control Plane Data Model
// Description: The entities that flow through every component of the plane.
// Purpose: Define Commit, ValidationResult, GateResult, Principal, Action,
//          ToolSpec, SandboxPermissions, AuditEntry, Snapshot, MemoryEntry,
//          and OutboxEntry exactly as specified.
// Dependencies: crate::{ids, taxonomy, time}
// ============================================================================

//! ## Overview
//! This module is the single source of truth for the wire shape of every
//! entity the plane operates on. No component crate defines its own
//! competing representation of a `Commit` or an `AuditEntry`; they all
//! import these types.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::ids::ActionId;
use crate::ids::CommitId;
use crate::ids::MemoryEntryId;
use crate::ids::PrincipalId;
use crate::ids::SnapshotId;
use crate::ids::SourceEventId;
use crate::ids::StepId;
use crate::ids::TaskId;
use crate::ids::ToolId;
use crate::ids::WorkflowId;
use crate::taxonomy::FailureCode;
use crate::time::Timestamp;

// ============================================================================
// SECTION: Commit
// ============================================================================

/// Metadata accompanying a commit, identifying the workflow it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMetadata {
    /// Workflow this commit belongs to.
    pub workflow_id: WorkflowId,
    /// Task this commit belongs to.
    pub task_id: TaskId,
    /// Step within the task.
    pub step_id: StepId,
    /// Upstream event that produced this commit, if any.
    pub source_event_id: Option<SourceEventId>,
    /// When the commit was constructed.
    pub timestamp: Timestamp,
}

/// The unit of work entering the plane.
///
/// # Invariants
/// - Immutable once constructed; no field is ever mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Unique identifier for this commit.
    pub id: CommitId,
    /// Opaque structured payload proposed by the upstream orchestrator.
    pub payload: Value,
    /// Optional reference to prior state, for monotonic checks.
    pub previous_state: Option<Value>,
    /// Workflow/task/step/event metadata.
    pub metadata: CommitMetadata,
}

// ============================================================================
// SECTION: Validation Result
// ============================================================================

/// The result produced by every validation operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the check passed.
    pub valid: bool,
    /// Human-readable explanation.
    pub reason: String,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Taxonomy tag, present when `valid` is false.
    pub failure_code: Option<FailureCode>,
    /// Remediation hint, present when `valid` is false.
    pub remediation: Option<String>,
    /// Free-form metadata attached by the producing operator.
    pub metadata: BTreeMap<String, Value>,
}

impl ValidationResult {
    /// Builds a passing result with full confidence and no metadata.
    #[must_use]
    pub fn ok(reason: impl Into<String>) -> Self {
        Self {
            valid: true,
            reason: reason.into(),
            confidence: 1.0,
            failure_code: None,
            remediation: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Builds a failing result with a taxonomy code and remediation hint
    /// drawn from the fixed catalog.
    #[must_use]
    pub fn fail(reason: impl Into<String>, code: FailureCode) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
            confidence: 0.0,
            failure_code: Some(code),
            remediation: Some(crate::taxonomy::remediation_for(code).to_string()),
            metadata: BTreeMap::new(),
        }
    }

    /// Returns a copy with the given confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Returns a copy with a metadata entry attached.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

// ============================================================================
// SECTION: Gate Result
// ============================================================================

/// Terminal status of a validation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    /// Every operator passed.
    Passed,
    /// At least one operator produced a low-confidence or advisory result,
    /// but nothing blocked the gate.
    Warning,
    /// A validator failed and the gate stops the pipeline.
    Blocked,
}

/// Aggregates per-operator validation results plus a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    /// Terminal status for the gate.
    pub status: GateStatus,
    /// Per-operator results, in pipeline order.
    pub results: Vec<ValidationResult>,
    /// The failure code that triggered a block, if any.
    pub triggering_failure_code: Option<FailureCode>,
    /// Remediation hint for the triggering failure, if any.
    pub remediation: Option<String>,
}

impl GateResult {
    /// Whether the gate passed (status is `Passed`; `Warning` also counts as
    /// passed for the purposes of continuing the pipeline, only `Blocked`
    /// stops it).
    #[must_use]
    pub fn passed(&self) -> bool {
        !matches!(self.status, GateStatus::Blocked)
    }

    /// Whether the gate blocked the pipeline.
    #[must_use]
    pub fn blocked(&self) -> bool {
        matches!(self.status, GateStatus::Blocked)
    }
}

// ============================================================================
// SECTION: Principal & Permissions
// ============================================================================

/// Data zones, forming a partial order `public ⊂ internal ⊂ confidential ⊂
/// restricted`. A permission granted at a given zone covers that zone and
/// every less sensitive zone below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataZone {
    /// Publicly shareable data.
    Public,
    /// Internal-only data.
    Internal,
    /// Confidential data.
    Confidential,
    /// Highly restricted data.
    Restricted,
}

/// A single permission grant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Permission {
    /// Action name this permission covers (matches [`Action::name`]).
    pub action: String,
    /// Resource pattern this permission covers.
    pub resource: String,
    /// Maximum data zone this permission grants access to.
    pub data_zone: Option<DataZone>,
}

/// Identifies the caller of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal identifier.
    pub id: PrincipalId,
    /// Principal type (e.g. `"agent"`, `"user"`, `"service"`).
    pub kind: String,
    /// Set of permissions held by this principal.
    pub permissions: BTreeSet<Permission>,
}

impl Principal {
    /// Returns the broadest data zone granted for `(action, resource)`, if
    /// any matching permission exists.
    #[must_use]
    pub fn zone_for(&self, action: &str, resource: &str) -> Option<DataZone> {
        self.permissions
            .iter()
            .filter(|p| p.action == action && resource_matches(&p.resource, resource))
            .filter_map(|p| p.data_zone)
            .max()
    }

    /// Whether this principal holds a permission for `(action, resource)`
    /// regardless of zone.
    #[must_use]
    pub fn has_permission(&self, action: &str, resource: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p.action == action && resource_matches(&p.resource, resource))
    }
}

/// Matches a resource pattern against a concrete resource. Supports a
/// trailing `*` wildcard; otherwise requires exact equality.
#[must_use]
pub fn resource_matches(pattern: &str, resource: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix('*') {
        resource.starts_with(prefix)
    } else {
        pattern == resource
    }
}

// ============================================================================
// SECTION: Action
// ============================================================================

/// Coarse classification of action danger driving policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// Low-risk action.
    Low,
    /// Medium-risk action.
    Medium,
    /// High-risk action.
    High,
    /// Critical-risk action.
    Critical,
}

/// Coarse classification of what an action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Read-only access.
    Read,
    /// Write access.
    Write,
    /// Delete access.
    Delete,
    /// Arbitrary execution.
    Execute,
    /// Administrative access.
    Admin,
}

impl Intent {
    /// Whether this intent is considered elevated (beyond plain reads).
    #[must_use]
    pub const fn is_elevated(self) -> bool {
        !matches!(self, Self::Read)
    }
}

/// The policy view of a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Action identifier.
    pub id: ActionId,
    /// Action name, matched against principal permissions.
    pub name: String,
    /// Risk tier driving the policy decision.
    pub risk_tier: RiskTier,
    /// Permissions required to perform this action.
    pub required_permissions: Vec<Permission>,
    /// Declared intent.
    pub intent: Intent,
    /// If non-empty, the only tool ids this action may invoke.
    pub allowed_tools: Vec<ToolId>,
}

// ============================================================================
// SECTION: Tool Spec
// ============================================================================

/// Strategy a tool declares for achieving execute-once semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdempotencyStrategy {
    /// Replay the cached result for a repeated idempotency key.
    CacheReplay,
    /// The tool is naturally idempotent; no wrapper bookkeeping needed.
    Natural,
    /// The tool accepts a request id the wrapper threads through.
    RequestId,
    /// No idempotency guarantee is made.
    None,
}

/// Declares a tool's inverse operation for rollback compensation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compensation {
    /// Tool id of the compensating (inverse) operation.
    pub tool_id: ToolId,
    /// Arguments template for the compensating call. Concrete argument
    /// substitution is the tool execution wrapper's responsibility.
    pub args_template: Value,
}

/// Declares a tool available to the plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool identifier.
    pub id: ToolId,
    /// Tool name.
    pub name: String,
    /// JSON-Schema-subset describing accepted input.
    pub input_schema: Option<Value>,
    /// JSON-Schema-subset describing produced output.
    pub output_schema: Option<Value>,
    /// Whether invoking this tool has a side effect.
    pub side_effect: bool,
    /// Idempotency strategy this tool honors.
    pub idempotency_strategy: IdempotencyStrategy,
    /// Inverse operation for rollback compensation, if any.
    pub compensation: Option<Compensation>,
}

// ============================================================================
// SECTION: Sandbox Permissions
// ============================================================================

/// Filesystem access rules for a sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FilesystemPermissions {
    /// Paths (may include trailing `*` wildcards) open for reading.
    pub read_only_paths: Vec<String>,
    /// Paths open for both reading and writing.
    pub read_write_paths: Vec<String>,
    /// Paths that are always denied, overriding any allow rule.
    pub denied_paths: Vec<String>,
    /// Maximum total disk usage in bytes, if bounded.
    pub max_disk_bytes: Option<u64>,
    /// Maximum number of files the sandbox may create, if bounded.
    pub max_file_count: Option<u64>,
}

/// Network access rules for a sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NetworkPermissions {
    /// Master enable flag; `false` denies all network access.
    pub enabled: bool,
    /// Allowed domains; entries may start with `*.` to match any subdomain.
    pub allowed_domains: Vec<String>,
    /// Denied domains, overriding any allow rule.
    pub denied_domains: Vec<String>,
    /// Allowed destination ports; empty means all ports are allowed.
    pub allowed_ports: Vec<u16>,
    /// Allowed IP CIDR ranges, as strings (e.g. `"10.0.0.0/8"`).
    pub allowed_ip_ranges: Vec<String>,
    /// Maximum bandwidth in bytes/sec, if bounded.
    pub max_bandwidth_bytes_per_sec: Option<u64>,
}

/// Resource limits for a sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResourceLimits {
    /// Maximum CPU units (abstract; provider-defined unit).
    pub max_cpu_units: Option<u64>,
    /// Maximum memory usage in bytes.
    pub max_memory_bytes: Option<u64>,
    /// Maximum execution wall-time in milliseconds. Hard limit: never
    /// escalable (see `spec.md` §4.4).
    pub max_execution_time_ms: Option<u64>,
    /// Maximum number of processes the sandbox may spawn.
    pub max_process_count: Option<u64>,
}

/// The full permission envelope granted to a sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SandboxPermissions {
    /// Filesystem rules.
    pub filesystem: FilesystemPermissions,
    /// Network rules.
    pub network: NetworkPermissions,
    /// Resource limits.
    pub resources: ResourceLimits,
    /// Granted capability names.
    pub capabilities: BTreeSet<String>,
    /// Environment variable names the sandbox may read.
    pub allowed_env_vars: BTreeSet<String>,
}

// ============================================================================
// SECTION: Audit Entry
// ============================================================================

/// Workflow/task/step/source-event provenance carried by an audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Provenance {
    /// Originating task id, if applicable.
    pub task_id: Option<TaskId>,
    /// Originating step id, if applicable.
    pub step_id: Option<StepId>,
    /// Originating upstream source-event id, if applicable.
    pub source_event_id: Option<SourceEventId>,
}

/// An append-only audit record.
///
/// # Invariants
/// - Immutable post-append.
/// - `sequence` is strictly increasing within a workflow.
/// - `previous_hash` equals the prior entry's `content_hash` (or is absent
///   for the first entry in a chain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Strictly increasing sequence number within the chain.
    pub sequence: u64,
    /// Identifier for this audit entry.
    pub id: String,
    /// When this entry was appended.
    pub timestamp: Timestamp,
    /// Actor responsible for the recorded action (`"system"` for
    /// plane-initiated entries such as rollback).
    pub actor: String,
    /// Name of the action recorded.
    pub action_name: String,
    /// State before the action, if captured.
    pub state_before: Option<Value>,
    /// State after the action, if captured.
    pub state_after: Option<Value>,
    /// Structural diff between before/after, if computed.
    pub diff: Option<Value>,
    /// Content hash over the normalized entry, excluding hash fields.
    pub content_hash: String,
    /// Content hash of the previous entry in the chain, if any.
    pub previous_hash: Option<String>,
    /// Workflow/task/step/source-event provenance.
    pub provenance: Provenance,
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// What triggered a snapshot to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotTrigger {
    /// Created by the scheduler on a fixed interval.
    Scheduled,
    /// Created because accumulated state changes crossed a threshold.
    StateChange,
    /// Created because accumulated memory writes crossed a threshold.
    MemoryThreshold,
    /// Created because the forced maximum interval elapsed.
    TimeThreshold,
    /// Created explicitly by a caller.
    Manual,
}

/// A state checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot identifier.
    pub id: SnapshotId,
    /// When the snapshot was taken.
    pub timestamp: Timestamp,
    /// The checkpointed state payload.
    pub state: Value,
    /// Whether this snapshot has been ratified as a rollback target.
    pub verified: bool,
    /// Agent id this snapshot belongs to.
    pub agent_id: PrincipalId,
    /// Session id this snapshot belongs to.
    pub session_id: String,
    /// Cycle number within the session.
    pub cycle_number: u64,
    /// References to audit/memory entries committed since the previous
    /// snapshot.
    pub memory_pointers: Vec<String>,
    /// What triggered this snapshot.
    pub trigger: SnapshotTrigger,
}

// ============================================================================
// SECTION: Memory Entry
// ============================================================================

/// The kind of content a memory entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// A short, free-form episodic note.
    EpisodicNote,
    /// A durable artifact (file, generated document, etc).
    Artifact,
    /// A reference to a snapshot.
    Snapshot,
}

/// Retention tier for a memory entry; evolves with age and access count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionTier {
    /// Most recently written / most frequently accessed.
    Hot,
    /// Recently written, infrequently accessed.
    Warm,
    /// Old, rarely accessed.
    Cold,
    /// Retained only in compacted or summarized form.
    Archived,
}

/// A long-lived memory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Memory entry identifier.
    pub id: MemoryEntryId,
    /// Entry content.
    pub content: Value,
    /// Entry type.
    pub entry_type: MemoryType,
    /// Workflow/task/step/source-event provenance.
    pub provenance: Provenance,
    /// Free-form tags for retrieval.
    pub tags: BTreeSet<String>,
    /// Free-form metadata.
    pub metadata: BTreeMap<String, Value>,
    /// Current retention tier.
    pub retention_tier: RetentionTier,
    /// When this entry was created.
    pub created_at: Timestamp,
    /// When this entry was last accessed.
    pub last_accessed_at: Timestamp,
    /// Number of times this entry has been accessed.
    pub access_count: u64,
}

// ============================================================================
// SECTION: Outbox Entry
// ============================================================================

/// Execution state of an outbox entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxState {
    /// Execution has been started but not yet finished.
    Pending,
    /// Execution completed successfully; `result` is authoritative.
    Committed,
    /// Execution failed; a retried call with the same key re-executes.
    Failed,
}

/// A transactional record of a side-effecting execution.
///
/// # Invariants
/// - The idempotency key is unique: at most one entry exists per key.
/// - `Committed` entries replay their stored result rather than
///   re-executing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEntry {
    /// Deterministic idempotency key for the underlying effect.
    pub idempotency_key: String,
    /// Current state.
    pub state: OutboxState,
    /// Stored result payload, present once `state` is `Committed`.
    pub result: Option<Value>,
    /// Number of execution attempts made for this key.
    pub attempt_count: u32,
}
