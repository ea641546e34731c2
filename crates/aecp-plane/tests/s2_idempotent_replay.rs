// crates/aecp-plane/tests/s2_idempotent_replay.rs
// ============================================================================
// Scenario S2 — Idempotent file write replay (`spec.md` §8).
// ============================================================================
//! A side-effecting file-write tool is invoked twice with identical args.
//! The first call performs the write and commits the outbox entry; an
//! out-of-band modification then tampers with the file; the second call
//! with the same idempotency key replays the first result without
//! re-invoking the tool, and the tampered file contents are left alone.

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

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use aecp_audit::InMemoryAuditLog;
use aecp_audit::InMemorySnapshotStore;
use aecp_core::Action;
use aecp_core::ActionId;
use aecp_core::FilesystemPermissions;
use aecp_core::Intent;
use aecp_core::Principal;
use aecp_core::PrincipalId;
use aecp_core::RiskTier;
use aecp_core::SandboxId;
use aecp_core::SandboxPermissions;
use aecp_core::StepId;
use aecp_core::TaskId;
use aecp_core::Timestamp;
use aecp_core::ToolId;
use aecp_core::ToolSpec;
use aecp_core::WorkflowId;
use aecp_effort::UnknownMetricsAggregator;
use aecp_effort::WorldModelScores;
use aecp_execution::ExecutionOutcome;
use aecp_execution::InMemoryOutbox;
use aecp_execution::InvocationRequest;
use aecp_plane::ControlPlane;
use aecp_plane::PlaneConfig;
use aecp_sandbox::AutoDenyEscalationHandler;
use aecp_sandbox::ConcreteProvider;
use aecp_telemetry::NullTelemetrySink;
use serde_json::Value;
use serde_json::json;

#[test]
fn replayed_call_does_not_repeat_the_write() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("a.txt");

    let plane = ControlPlane::new(
        PlaneConfig::default(),
        Arc::new(InMemoryOutbox::default()),
        Box::new(InMemoryAuditLog::default()),
        Box::new(InMemorySnapshotStore::default()),
        Arc::new(NullTelemetrySink),
        Arc::new(AutoDenyEscalationHandler),
        Timestamp::from_unix_millis(0),
    )
    .expect("plane");

    let executions = Arc::new(AtomicUsize::new(0));
    let write_path = path.clone();
    let counter = Arc::clone(&executions);
    let provider = ConcreteProvider::new(move |invocation| {
        counter.fetch_add(1, Ordering::SeqCst);
        let content = invocation.args["content"].as_str().unwrap_or_default();
        std::fs::write(&write_path, content).map_err(|err| err.to_string())?;
        Ok(json!({"written": true}))
    });

    let permissions = SandboxPermissions {
        filesystem: FilesystemPermissions {
            read_write_paths: vec![dir.path().to_string_lossy().into_owned()],
            ..FilesystemPermissions::default()
        },
        ..SandboxPermissions::default()
    };

    let sandbox = Arc::new(plane.new_sandbox(
        SandboxId::new("sb1"),
        WorkflowId::new("w1"),
        TaskId::new("t1"),
        PrincipalId::new("agent-1"),
        permissions,
        Box::new(provider),
    ));

    let principal = Principal { id: PrincipalId::new("agent-1"), kind: "agent".to_string(), permissions: BTreeSet::new() };
    let action = Action {
        id: ActionId::new("write-file"),
        name: "write_file".to_string(),
        risk_tier: RiskTier::Low,
        required_permissions: Vec::new(),
        intent: Intent::Write,
        allowed_tools: Vec::new(),
    };
    let tool = ToolSpec {
        id: ToolId::new("file.write"),
        name: "file.write".to_string(),
        input_schema: None,
        output_schema: None,
        side_effect: true,
        idempotency_strategy: aecp_core::IdempotencyStrategy::CacheReplay,
        compensation: None,
    };
    let world_model = WorldModelScores { cost: 0.1, risk: 0.1, quality: 0.9 };
    let aggregator = UnknownMetricsAggregator;
    let wrapper = plane.execution_wrapper();
    let args: Value = json!({"path": path.to_string_lossy(), "content": "hi"});

    let make_request = |sandbox: &Arc<aecp_sandbox::Sandbox>| InvocationRequest {
        workflow_id: WorkflowId::new("w1"),
        task_id: TaskId::new("t1"),
        step_id: StepId::new("s1"),
        principal: &principal,
        action: &action,
        tool: &tool,
        args: args.clone(),
        input_pipeline: None,
        output_pipeline: None,
        sandbox: Arc::clone(sandbox),
        aggregator: &aggregator,
        world_model: &world_model,
    };

    let first = wrapper.execute(make_request(&sandbox));
    assert_eq!(first, ExecutionOutcome::Committed(json!({"written": true})));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hi");

    std::fs::write(&path, "tamper").unwrap();

    let second = wrapper.execute(make_request(&sandbox));
    assert_eq!(second, ExecutionOutcome::Replayed(json!({"written": true})));
    assert_eq!(executions.load(Ordering::SeqCst), 1, "the tool must not be re-invoked on replay");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "tamper", "replay must not touch the tampered file");
}
