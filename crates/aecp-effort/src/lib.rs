// crates/aecp-effort/src/lib.rs
// ============================================================================
// Module: Effort Evaluator
// Description: Cost/risk scorer fusing world-model soft constraints and
//              rolling observability metrics.
// Purpose: Pre-empt costly or risky work before (or instead of) policy and
//          before tool execution.
// Dependencies: aecp-core
// ============================================================================

//! ## Overview
//! Implements `spec.md` §4.3. [`EffortEvaluator::evaluate`] combines three
//! inputs into one composite score in `[0.0, 1.0]` (higher is better: more
//! worth doing) and partitions it against two thresholds into
//! `{approve, review, reject}`. Only `reject` short-circuits; `review`
//! forwards to the normal policy path (`aecp-policy`), matching `spec.md`
//! §4.3: "Only `reject` short-circuits".

use aecp_core::RiskTier;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

/// World-model soft-constraint scores, each in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldModelScores {
    /// Estimated cost of the action; `0.0` = free, `1.0` = maximally
    /// expensive.
    pub cost: f64,
    /// Estimated risk of the action; `0.0` = safe, `1.0` = maximally risky.
    pub risk: f64,
    /// Estimated quality of the expected outcome; `0.0` = worthless,
    /// `1.0` = ideal.
    pub quality: f64,
}

impl WorldModelScores {
    fn weighted_goodness(&self, weights: &ConstraintWeights) -> f64 {
        let total_weight = weights.cost + weights.risk + weights.quality;
        if total_weight <= 0.0 {
            return 0.5;
        }
        let goodness = weights.cost * (1.0 - self.cost)
            + weights.risk * (1.0 - self.risk)
            + weights.quality * self.quality;
        (goodness / total_weight).clamp(0.0, 1.0)
    }
}

/// Relative weights for the three soft-constraint categories.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintWeights {
    /// Weight applied to the cost category.
    pub cost: f64,
    /// Weight applied to the risk category.
    pub risk: f64,
    /// Weight applied to the quality category.
    pub quality: f64,
}

impl Default for ConstraintWeights {
    fn default() -> Self {
        Self {
            cost: 1.0,
            risk: 1.0,
            quality: 1.0,
        }
    }
}

/// Rolling observability metrics for a tool or action, as reported by a
/// metrics aggregator (`spec.md` §4.3: "tool success rate, mean latency,
/// human escalation rate").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingMetrics {
    /// Fraction of recent invocations that succeeded, in `[0.0, 1.0]`.
    pub success_rate: f64,
    /// Mean latency in milliseconds over the rolling window.
    pub mean_latency_ms: f64,
    /// Fraction of recent invocations that required human escalation, in
    /// `[0.0, 1.0]`.
    pub human_escalation_rate: f64,
}

impl RollingMetrics {
    /// A neutral baseline used when no metrics have been observed yet.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            success_rate: 1.0,
            mean_latency_ms: 0.0,
            human_escalation_rate: 0.0,
        }
    }

    fn normalized_goodness(&self, latency_budget_ms: f64) -> f64 {
        let latency_penalty = if latency_budget_ms <= 0.0 {
            0.0
        } else {
            (self.mean_latency_ms / latency_budget_ms).clamp(0.0, 1.0)
        };
        (self.success_rate * (1.0 - latency_penalty) * (1.0 - self.human_escalation_rate))
            .clamp(0.0, 1.0)
    }
}

/// Pluggable source of rolling metrics, kept separate from the evaluator so
/// callers can back it with a real time-series store.
pub trait MetricsAggregator: Send + Sync {
    /// Returns the current rolling metrics for the named tool or action.
    fn metrics_for(&self, subject: &str) -> RollingMetrics;
}

/// A metrics aggregator that always reports the unknown baseline; used as a
/// safe default and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownMetricsAggregator;

impl MetricsAggregator for UnknownMetricsAggregator {
    fn metrics_for(&self, _subject: &str) -> RollingMetrics {
        RollingMetrics::unknown()
    }
}

/// The three-way partition an effort evaluation can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortDecision {
    /// Proceed to tool execution (after policy, if not already run).
    Approve,
    /// Forward to the normal policy path.
    Review,
    /// Short-circuit: do not proceed.
    Reject,
}

/// The outcome of an effort evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffortVerdict {
    /// The composite score in `[0.0, 1.0]`.
    pub score: f64,
    /// The partition the score landed in.
    pub decision: EffortDecision,
    /// Human-readable justification.
    pub reason: String,
}

/// Configuration for an [`EffortEvaluator`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffortThresholds {
    /// Score at or above which the verdict is `Approve`.
    pub approve_at_or_above: f64,
    /// Score at or below which the verdict is `Reject`.
    pub reject_at_or_below: f64,
}

impl Default for EffortThresholds {
    fn default() -> Self {
        Self {
            approve_at_or_above: 0.7,
            reject_at_or_below: 0.2,
        }
    }
}

const RISK_TIER_PENALTY: [f64; 4] = [0.0, 0.05, 0.15, 0.30];

fn risk_tier_penalty(tier: RiskTier) -> f64 {
    match tier {
        RiskTier::Low => RISK_TIER_PENALTY[0],
        RiskTier::Medium => RISK_TIER_PENALTY[1],
        RiskTier::High => RISK_TIER_PENALTY[2],
        RiskTier::Critical => RISK_TIER_PENALTY[3],
    }
}

/// Scores and partitions proposed actions before tool execution.
#[derive(Debug, Clone, Copy)]
pub struct EffortEvaluator {
    weights: ConstraintWeights,
    thresholds: EffortThresholds,
    latency_budget_ms: f64,
}

impl EffortEvaluator {
    /// Creates a new evaluator with the given weights, thresholds, and
    /// latency budget used to normalize observed latency into `[0.0, 1.0]`.
    #[must_use]
    pub const fn new(weights: ConstraintWeights, thresholds: EffortThresholds, latency_budget_ms: f64) -> Self {
        Self {
            weights,
            thresholds,
            latency_budget_ms,
        }
    }

    /// Evaluates a proposed action given its world-model scores, the risk
    /// tier it was classified with, and metrics for the subject (tool or
    /// action name) drawn from `aggregator`.
    #[must_use]
    pub fn evaluate(
        &self,
        world_model: &WorldModelScores,
        risk_tier: RiskTier,
        subject: &str,
        aggregator: &dyn MetricsAggregator,
    ) -> EffortVerdict {
        let metrics = aggregator.metrics_for(subject);
        let constraint_goodness = world_model.weighted_goodness(&self.weights);
        let metrics_goodness = metrics.normalized_goodness(self.latency_budget_ms);
        let score =
            (0.5 * constraint_goodness + 0.5 * metrics_goodness - risk_tier_penalty(risk_tier)).clamp(0.0, 1.0);

        let decision = if score <= self.thresholds.reject_at_or_below {
            EffortDecision::Reject
        } else if score >= self.thresholds.approve_at_or_above {
            EffortDecision::Approve
        } else {
            EffortDecision::Review
        };

        let reason = format!(
            "score {score:.2} (constraints {constraint_goodness:.2}, metrics {metrics_goodness:.2}, risk_tier {risk_tier:?})"
        );

        debug!(subject, score, decision = ?decision, "effort evaluation completed");

        EffortVerdict { score, decision, reason }
    }
}
