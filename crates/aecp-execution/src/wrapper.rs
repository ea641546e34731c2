// crates/aecp-execution/src/wrapper.rs
// ============================================================================
// Module: Tool Execution Wrapper
// Description: The end-to-end per-invocation flow: schema checks, policy
//              gate, effort evaluator, CRV gates, sandboxed execution under
//              a timeout, outbox commit, and compensation on failure.
// Purpose: The single choke point every side-effecting tool call passes
//          through.
// Dependencies: aecp-core, aecp-policy, aecp-effort, aecp-validation,
//               aecp-sandbox, crate::{idempotency, outbox, audit_hook}
// ============================================================================

//! ## Overview
//! Implements `spec.md` §4.5's nine-step flow. Steps 1–4 (input schema,
//! policy, effort, CRV input gate) run before any side effect; step 5
//! acquires the sandbox; step 6 executes under a wall-clock timeout; steps
//! 7–8 validate output and commit; step 9 runs compensation on any
//! failure from steps 4 through 7.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use aecp_core::Action;
use aecp_core::FailureCode;
use aecp_core::Principal;
use aecp_core::StepId;
use aecp_core::TaskId;
use aecp_core::ToolSpec;
use aecp_core::WorkflowId;
use aecp_effort::EffortDecision;
use aecp_effort::EffortEvaluator;
use aecp_effort::MetricsAggregator;
use aecp_effort::WorldModelScores;
use aecp_policy::GoalGuard;
use aecp_policy::PolicyState;
use aecp_sandbox::Sandbox;
use aecp_sandbox::ToolInvocation;
use aecp_validation::OperatorValue;
use aecp_validation::ValidationPipeline;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::audit_hook::ExecutionAuditEvent;
use crate::audit_hook::ExecutionAuditSink;
use crate::idempotency::idempotency_key;
use crate::outbox::OutboxDecision;
use crate::outbox::OutboxStore;

/// A failure surfaced from any stage of the execution flow.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} stage failed: {reason}")]
pub struct ExecutionFailure {
    /// Closed failure code (`spec.md` §4.1/§7).
    pub code: FailureCode,
    /// Human-readable reason.
    pub reason: String,
    /// The stage that produced the failure, for audit/diagnostics.
    pub stage: &'static str,
    /// The offending value, if any, carried for diagnosis (`spec.md` §8
    /// scenario S3: "the data field of the failure result still carries
    /// the offending value"). `Value::Null` when no single value is at
    /// fault (e.g. a policy or effort denial).
    pub data: Value,
}

/// The terminal outcome of one invocation through the wrapper.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// A prior committed result was replayed without re-executing.
    Replayed(Value),
    /// Execution completed and the outbox entry was committed.
    Committed(Value),
    /// The invocation failed and no compensation was declared or needed
    /// (e.g. it failed before any side effect occurred).
    Failed(ExecutionFailure),
    /// The invocation failed after a side effect and the declared
    /// compensation ran successfully.
    CompensatedFailure(ExecutionFailure),
    /// The invocation failed and the declared compensation itself failed;
    /// requires human intervention. Surfaced via audit per `spec.md`
    /// §4.5.
    NeedsManualIntervention(ExecutionFailure),
}

/// Everything the wrapper needs to carry out one invocation.
pub struct InvocationRequest<'a> {
    /// Workflow this invocation belongs to.
    pub workflow_id: WorkflowId,
    /// Task this invocation belongs to.
    pub task_id: TaskId,
    /// Step within the task.
    pub step_id: StepId,
    /// Principal attempting the action.
    pub principal: &'a Principal,
    /// The policy-visible action being attempted.
    pub action: &'a Action,
    /// The tool specification being invoked.
    pub tool: &'a ToolSpec,
    /// Tool arguments.
    pub args: Value,
    /// Optional CRV pipeline applied to the input before execution.
    pub input_pipeline: Option<&'a ValidationPipeline>,
    /// Optional CRV pipeline applied to the output after execution.
    pub output_pipeline: Option<&'a ValidationPipeline>,
    /// The sandbox this invocation executes within.
    pub sandbox: Arc<Sandbox>,
    /// Rolling-metrics source for the effort evaluator.
    pub aggregator: &'a dyn MetricsAggregator,
    /// World-model soft-constraint scores for the effort evaluator.
    pub world_model: &'a WorldModelScores,
}

/// Wires the policy gate, effort evaluator, outbox, and audit sink around
/// sandboxed tool execution.
pub struct ToolExecutionWrapper {
    policy: GoalGuard,
    effort: EffortEvaluator,
    outbox: Arc<dyn OutboxStore>,
    audit_sink: Box<dyn ExecutionAuditSink>,
    timeout: Duration,
}

impl ToolExecutionWrapper {
    /// Creates a new wrapper.
    #[must_use]
    pub fn new(
        policy: GoalGuard,
        effort: EffortEvaluator,
        outbox: Arc<dyn OutboxStore>,
        audit_sink: Box<dyn ExecutionAuditSink>,
        timeout: Duration,
    ) -> Self {
        Self { policy, effort, outbox, audit_sink, timeout }
    }

    fn emit(&self, request: &InvocationRequest<'_>, event_type: &'static str, data: Value) {
        self.audit_sink.record(ExecutionAuditEvent {
            workflow_id: request.workflow_id.clone(),
            task_id: request.task_id.clone(),
            step_id: request.step_id.clone(),
            tool_id: request.tool.id.clone(),
            principal_id: request.principal.id.clone(),
            event_type,
            data,
        });
    }

    /// Runs one invocation through the full flow described in `spec.md`
    /// §4.5.
    pub fn execute(&self, request: InvocationRequest<'_>) -> ExecutionOutcome {
        let key = match idempotency_key(&request.task_id, &request.step_id, &request.tool.id, &request.args) {
            Ok(key) => key,
            Err(err) => {
                warn!(tool_id = request.tool.id.as_str(), error = %err, "failed to derive idempotency key");
                return ExecutionOutcome::Failed(ExecutionFailure {
                    code: FailureCode::ToolError,
                    reason: format!("could not derive idempotency key: {err}"),
                    stage: "idempotency",
                    data: request.args.clone(),
                });
            }
        };

        match self.outbox.begin(&key) {
            OutboxDecision::Replay(result) => {
                self.emit(&request, "tool_call", json!({"idempotency_key": key, "replayed": true}));
                return ExecutionOutcome::Replayed(result);
            }
            OutboxDecision::Execute => {}
        }

        if let Some(schema) = &request.tool.input_schema {
            if let Err(failure) = check_schema(schema, &request.args, "input") {
                self.outbox.fail(&key);
                return ExecutionOutcome::Failed(failure);
            }
        }

        let policy_verdict = self.policy.evaluate(request.principal, request.action, Some(&request.tool.id));
        self.emit(&request, "policy_check", json!({"state": format!("{:?}", policy_verdict.state)}));
        if !matches!(policy_verdict.state, PolicyState::Allowed) {
            self.outbox.fail(&key);
            warn!(tool_id = request.tool.id.as_str(), reason = %policy_verdict.reason, "policy gate denied invocation");
            return ExecutionOutcome::Failed(ExecutionFailure {
                code: FailureCode::PolicyViolation,
                reason: policy_verdict.reason,
                stage: "policy",
                data: Value::Null,
            });
        }

        let subject = request.tool.id.as_str();
        let effort_verdict = self.effort.evaluate(request.world_model, request.action.risk_tier, subject, request.aggregator);
        self.emit(&request, "effort_evaluation", json!({"decision": format!("{:?}", effort_verdict.decision), "score": effort_verdict.score}));
        if matches!(effort_verdict.decision, EffortDecision::Reject) {
            self.outbox.fail(&key);
            warn!(tool_id = subject, score = effort_verdict.score, "effort evaluator rejected invocation");
            return ExecutionOutcome::Failed(ExecutionFailure {
                code: FailureCode::PolicyViolation,
                reason: effort_verdict.reason,
                stage: "effort",
                data: Value::Null,
            });
        }

        if let Some(pipeline) = request.input_pipeline {
            let gate = pipeline.run(OperatorValue::Raw { value: Some(request.args.clone()) });
            self.emit(&request, "crv_result", json!({"stage": "input", "blocked": gate.blocked()}));
            if gate.blocked() {
                self.outbox.fail(&key);
                warn!(tool_id = request.tool.id.as_str(), "input validation pipeline blocked invocation");
                return ExecutionOutcome::Failed(ExecutionFailure {
                    code: gate.triggering_failure_code.unwrap_or(FailureCode::Conflict),
                    reason: gate.remediation.unwrap_or_else(|| "input validation blocked the gate".to_string()),
                    stage: "crv_input",
                    data: request.args.clone(),
                });
            }
        }

        let invocation = ToolInvocation { tool_id: request.tool.id.as_str().to_string(), args: request.args.clone() };
        let outcome = match execute_with_timeout(Arc::clone(&request.sandbox), invocation, self.timeout) {
            Ok(outcome) => outcome,
            Err(failure) => {
                self.outbox.fail(&key);
                return self.fail_with_compensation(&request, failure);
            }
        };

        if let Some(schema) = &request.tool.output_schema {
            if let Err(failure) = check_schema(schema, &outcome.output, "output") {
                self.outbox.fail(&key);
                return self.fail_with_compensation(&request, failure);
            }
        }

        if let Some(pipeline) = request.output_pipeline {
            let gate = pipeline.run(OperatorValue::Raw { value: Some(outcome.output.clone()) });
            self.emit(&request, "crv_result", json!({"stage": "output", "blocked": gate.blocked()}));
            if gate.blocked() {
                self.outbox.fail(&key);
                let failure = ExecutionFailure {
                    code: gate.triggering_failure_code.unwrap_or(FailureCode::Conflict),
                    reason: gate.remediation.unwrap_or_else(|| "output validation blocked the gate".to_string()),
                    stage: "crv_output",
                    data: outcome.output.clone(),
                };
                return self.fail_with_compensation(&request, failure);
            }
        }

        self.outbox.commit(&key, outcome.output.clone());
        self.emit(&request, "tool_call", json!({"idempotency_key": key, "replayed": false}));
        ExecutionOutcome::Committed(outcome.output)
    }

    fn fail_with_compensation(&self, request: &InvocationRequest<'_>, failure: ExecutionFailure) -> ExecutionOutcome {
        warn!(tool_id = request.tool.id.as_str(), stage = failure.stage, reason = %failure.reason, "execution failed");
        let Some(compensation) = &request.tool.compensation else {
            return ExecutionOutcome::Failed(failure);
        };
        let invocation = ToolInvocation { tool_id: compensation.tool_id.as_str().to_string(), args: compensation.args_template.clone() };
        match request.sandbox.execute(&invocation) {
            Ok(_) => ExecutionOutcome::CompensatedFailure(failure),
            Err(err) => {
                self.emit(request, "tool_call", json!({"compensation_failed": err.to_string()}));
                ExecutionOutcome::NeedsManualIntervention(failure)
            }
        }
    }
}

/// Checks `value` against `schema` for the named `stage` ("input" or
/// "output"). A violation at the output stage always fails with
/// `FailureCode::ToolError` (`spec.md` §8 scenario S3: the tool itself is
/// at fault for returning a shape it promised not to), regardless of
/// whether the underlying schema violation was a type mismatch or a
/// missing field; input-stage violations keep the schema operator's own
/// classification (`Conflict`/`MissingData`), since there the caller (not
/// a tool) supplied the offending value.
fn check_schema(schema: &Value, value: &Value, stage: &'static str) -> Result<(), ExecutionFailure> {
    use aecp_validation::Operator;
    use aecp_validation::operators::schema::VerifySchemaOperator;

    let operator = VerifySchemaOperator::new(schema.clone());
    let input = OperatorValue::Extracted { value: value.clone() };
    let output = operator.execute(&input).unwrap_or(OperatorValue::Attributes { attributes: Default::default() });
    let OperatorValue::Attributes { attributes } = output else {
        return Ok(());
    };
    let result: aecp_core::ValidationResult = attributes
        .get("validation_result")
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .unwrap_or_else(|| aecp_core::ValidationResult::ok("schema check produced no result"));
    if result.valid {
        Ok(())
    } else {
        let code = if stage == "output" { FailureCode::ToolError } else { result.failure_code.unwrap_or(FailureCode::Conflict) };
        Err(ExecutionFailure {
            code,
            reason: result.reason,
            stage,
            data: value.clone(),
        })
    }
}

fn execute_with_timeout(
    sandbox: Arc<Sandbox>,
    invocation: ToolInvocation,
    timeout: Duration,
) -> Result<aecp_sandbox::ToolOutcome, ExecutionFailure> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = sandbox.execute(&invocation);
        let _ = tx.send(result);
    });
    match rx.recv_timeout(timeout) {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(err)) => Err(ExecutionFailure {
            code: FailureCode::ToolError,
            reason: err.to_string(),
            stage: "execute",
            data: Value::Null,
        }),
        Err(_) => Err(ExecutionFailure {
            code: FailureCode::ToolError,
            reason: "timeout".to_string(),
            stage: "execute",
            data: Value::Null,
        }),
    }
}
