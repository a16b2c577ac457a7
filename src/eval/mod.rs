//! Detector evaluation harness
//!
//! Runs the scoring pipeline over a labeled dataset and produces an
//! `EvaluationReport`: a full threshold sweep (confusion matrix,
//! precision/recall/F1/FPR, FPR by repo type), the per-example score list,
//! the failure list, and the regression/launch gate verdicts. The report
//! is the unit persisted for auditability; the gate verdicts decide the
//! process exit status.

pub mod config;
pub mod dataset;
pub mod gates;
pub mod metrics;
pub mod runner;

pub use config::{EvalConfig, LaunchGateConfig, ModelConfig, RegressionConfig, ThresholdSpec};
pub use dataset::load_examples;
pub use gates::{LaunchVerdict, RegressionVerdict};
pub use metrics::{ConfusionMatrix, GroupFpr, Metrics, Observation, ThresholdReport};
pub use runner::{EvaluatedExample, EvaluationRunner};

use crate::models::ScoredExample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One example that could not be evaluated, with its cause
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleFailure {
    pub id: String,
    pub error: String,
}

/// Echo of the model settings a report was produced under
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub weight: f64,
}

/// Full output of one evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub generated_at: DateTime<Utc>,
    /// Examples in the input dataset
    pub example_count: usize,
    /// Examples that produced a score and entered the metrics
    pub evaluated: usize,
    /// Examples excluded because extraction/model scoring failed
    pub failed: usize,
    /// Examples never started because the run deadline was reached
    pub skipped: usize,
    pub failures: Vec<ExampleFailure>,
    pub model: ModelSettings,
    /// Independent metric sets, one per configured threshold
    pub sweep: Vec<ThresholdReport>,
    pub regression: RegressionVerdict,
    pub launch_gate: LaunchVerdict,
    /// Per-example scores in dataset order
    pub samples: Vec<ScoredExample>,
}

impl EvaluationReport {
    /// AND of both gate verdicts; drives the process exit status
    pub fn passed(&self) -> bool {
        self.regression.passed && self.launch_gate.passed
    }

    /// The sweep entry the gates were checked against
    pub fn gate_threshold_report(&self) -> Option<&ThresholdReport> {
        self.sweep
            .iter()
            .find(|t| t.label == self.launch_gate.threshold_label)
    }
}

/// Aggregate runner outcomes into the final report.
///
/// The config must already be validated (`EvalConfig::load` does this);
/// in particular the launch-gate label is known to be present in the
/// threshold list.
pub fn build_report(
    config: &EvalConfig,
    model_id: Option<&str>,
    outcomes: Vec<EvaluatedExample>,
) -> EvaluationReport {
    let example_count = outcomes.len();
    let mut samples = Vec::new();
    let mut failures = Vec::new();
    let mut skipped = 0usize;

    for outcome in outcomes {
        match outcome {
            EvaluatedExample::Scored(scored) => samples.push(scored),
            EvaluatedExample::Failed { id, error } => failures.push(ExampleFailure { id, error }),
            EvaluatedExample::Skipped { .. } => skipped += 1,
        }
    }

    let observations: Vec<Observation> = samples
        .iter()
        .map(|scored| Observation {
            score: scored.score,
            agent_generated: scored.example.agent_generated,
            group: scored.example.repo_type.clone(),
        })
        .collect();

    let sweep = metrics::sweep(&observations, &config.thresholds);
    let gate_label = &config.launch_gate.threshold_label;
    let observed_precision = sweep
        .iter()
        .find(|t| &t.label == gate_label)
        .map(|t| t.metrics.precision)
        .unwrap_or(0.0);

    let regression = gates::check_regression(config.regression.as_ref(), observed_precision);
    let launch_gate = gates::check_launch(&config.launch_gate, observed_precision);

    info!(
        evaluated = samples.len(),
        failed = failures.len(),
        skipped,
        precision = observed_precision,
        regression_passed = regression.passed,
        launch_passed = launch_gate.passed,
        "evaluation complete"
    );

    EvaluationReport {
        generated_at: Utc::now(),
        example_count,
        evaluated: samples.len(),
        failed: failures.len(),
        skipped,
        failures,
        model: ModelSettings {
            enabled: model_id.is_some(),
            model: model_id.map(str::to_string),
            weight: if model_id.is_some() {
                config.model.weight
            } else {
                0.0
            },
        },
        sweep,
        regression,
        launch_gate,
        samples,
    }
}
