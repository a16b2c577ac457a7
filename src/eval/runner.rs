//! Parallel evaluation of labeled examples
//!
//! Examples have no cross-example dependency, so the runner fans them out
//! over rayon. Output order always matches input order regardless of
//! scheduling (rayon's indexed collect), which keeps reports byte-stable
//! across runs with different worker counts.
//!
//! Each example is evaluated on a helper thread watched through a channel
//! so extraction or model I/O that hangs turns into a per-example failure
//! instead of stalling the run. A whole-run deadline, when configured,
//! stops launching new examples; those are reported as skipped, never as
//! zero-filled metrics.

use super::config::EvalConfig;
use crate::model::ModelJudge;
use crate::models::{LabeledExample, ScoredExample};
use crate::scoring::{self, WeightTable};
use crate::signals::SignalExtractor;
use anyhow::{bail, Context, Result};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Outcome of evaluating one labeled example
#[derive(Debug, Clone)]
pub enum EvaluatedExample {
    /// Scored successfully; participates in metrics
    Scored(ScoredExample),
    /// Extraction/model error or timeout; excluded from metrics, counted
    Failed { id: String, error: String },
    /// Run deadline hit before this example started
    Skipped { id: String },
}

impl EvaluatedExample {
    pub fn id(&self) -> &str {
        match self {
            EvaluatedExample::Scored(scored) => &scored.example.id,
            EvaluatedExample::Failed { id, .. } => id,
            EvaluatedExample::Skipped { id } => id,
        }
    }
}

/// Drives extractor → scorer → (optional) model judge over a labeled set
pub struct EvaluationRunner {
    extractor: Arc<dyn SignalExtractor>,
    judge: Option<Arc<dyn ModelJudge>>,
    weights: Arc<WeightTable>,
    model_weight: f64,
    example_timeout: Duration,
    run_timeout: Option<Duration>,
    show_progress: bool,
}

impl EvaluationRunner {
    pub fn new(extractor: Arc<dyn SignalExtractor>, weights: WeightTable) -> Self {
        Self {
            extractor,
            judge: None,
            weights: Arc::new(weights),
            model_weight: 0.0,
            example_timeout: Duration::from_secs(60),
            run_timeout: None,
            show_progress: false,
        }
    }

    /// Enable model-assisted scoring with the given blend weight
    pub fn with_judge(mut self, judge: Arc<dyn ModelJudge>, model_weight: f64) -> Self {
        self.judge = Some(judge);
        self.model_weight = model_weight;
        self
    }

    pub fn with_example_timeout(mut self, timeout: Duration) -> Self {
        self.example_timeout = timeout;
        self
    }

    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Apply timeout settings from an evaluation config
    pub fn with_timeouts_from(self, config: &EvalConfig) -> Self {
        self.with_example_timeout(Duration::from_secs(config.example_timeout_secs))
            .with_run_timeout(config.run_timeout_secs.map(Duration::from_secs))
    }

    /// Evaluate every example; output order matches input order
    pub fn run(&self, examples: &[LabeledExample]) -> Vec<EvaluatedExample> {
        let deadline = self.run_timeout.map(|t| Instant::now() + t);
        let bar = if self.show_progress {
            ProgressBar::new(examples.len() as u64)
        } else {
            ProgressBar::hidden()
        };

        let results: Vec<EvaluatedExample> = examples
            .par_iter()
            .map(|example| {
                let outcome = if deadline.is_some_and(|d| Instant::now() >= d) {
                    debug!(id = %example.id, "run deadline reached, skipping example");
                    EvaluatedExample::Skipped {
                        id: example.id.clone(),
                    }
                } else {
                    self.evaluate_with_timeout(example)
                };
                if let EvaluatedExample::Failed { id, error } = &outcome {
                    warn!(id = %id, error = %error, "example failed to evaluate");
                }
                bar.inc(1);
                outcome
            })
            .collect();
        bar.finish_and_clear();
        results
    }

    /// Evaluate one example on a watched helper thread
    fn evaluate_with_timeout(&self, example: &LabeledExample) -> EvaluatedExample {
        let (tx, rx) = mpsc::channel();
        let extractor = Arc::clone(&self.extractor);
        let judge = self.judge.clone();
        let weights = Arc::clone(&self.weights);
        let model_weight = self.model_weight;
        let owned = example.clone();

        // The helper thread is detached on timeout; it finishes (or hangs)
        // on its own while the run moves on.
        std::thread::spawn(move || {
            let result = evaluate_one(
                extractor.as_ref(),
                judge.as_deref(),
                &weights,
                model_weight,
                &owned,
            );
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.example_timeout) {
            Ok(Ok(scored)) => EvaluatedExample::Scored(scored),
            Ok(Err(error)) => EvaluatedExample::Failed {
                id: example.id.clone(),
                error: format!("{error:#}"),
            },
            Err(_) => EvaluatedExample::Failed {
                id: example.id.clone(),
                error: format!(
                    "timed out after {}s",
                    self.example_timeout.as_secs_f64()
                ),
            },
        }
    }
}

/// Extract, validate, score, and optionally blend one example
fn evaluate_one(
    extractor: &dyn SignalExtractor,
    judge: Option<&dyn ModelJudge>,
    weights: &WeightTable,
    model_weight: f64,
    example: &LabeledExample,
) -> Result<ScoredExample> {
    let subject = example.subject();
    let signals = extractor
        .extract(&subject)
        .with_context(|| format!("extractor '{}' failed", extractor.name()))?;

    // Out-of-range scores are extractor bugs; reject, never clamp
    for signal in signals.signals() {
        if !(0.0..=1.0).contains(&signal.score) || signal.score.is_nan() {
            bail!(
                "extractor '{}' produced signal '{}' with score {} outside 0.0..=1.0",
                extractor.name(),
                signal.name,
                signal.score
            );
        }
    }

    let heuristic_score = scoring::score(&signals, weights);
    let (score, model_score) = match judge {
        Some(judge) => {
            let analysis = judge
                .judge(&subject)
                .with_context(|| format!("model '{}' failed", judge.model_id()))?;
            (
                scoring::blend(heuristic_score, analysis.score, model_weight),
                Some(analysis.score),
            )
        }
        None => (heuristic_score, None),
    };

    Ok(ScoredExample {
        example: example.clone(),
        score,
        heuristic_score,
        model_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FixedJudge, ModelAnalysis, ModelError, ModelResult};
    use crate::models::{Signal, SignalSet, Subject};
    use crate::signals::FixedExtractor;

    fn weights(pairs: &[(&str, f64)]) -> WeightTable {
        WeightTable::from_map(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()).unwrap()
    }

    fn example(id: &str, agent_generated: bool) -> LabeledExample {
        LabeledExample {
            id: id.to_string(),
            subject_type: Default::default(),
            repo_path: "/tmp/unused".into(),
            repo_type: "test".to_string(),
            agent_generated,
            max_commits: 10,
        }
    }

    fn fixed_extractor(score: f64) -> Arc<dyn SignalExtractor> {
        let set: SignalSet = [Signal::new("automation_marker", score, "").unwrap()]
            .into_iter()
            .collect();
        Arc::new(FixedExtractor::new(set))
    }

    struct FailingExtractor;
    impl SignalExtractor for FailingExtractor {
        fn name(&self) -> &str {
            "failing"
        }
        fn extract(&self, _subject: &Subject) -> Result<SignalSet> {
            bail!("boom")
        }
    }

    struct SlowExtractor;
    impl SignalExtractor for SlowExtractor {
        fn name(&self) -> &str {
            "slow"
        }
        fn extract(&self, _subject: &Subject) -> Result<SignalSet> {
            std::thread::sleep(Duration::from_secs(5));
            Ok(SignalSet::new())
        }
    }

    struct FailingJudge;
    impl ModelJudge for FailingJudge {
        fn model_id(&self) -> &str {
            "failing-judge"
        }
        fn judge(&self, _subject: &Subject) -> ModelResult<ModelAnalysis> {
            Err(ModelError::RequestFailed("connection refused".to_string()))
        }
    }

    struct SlowJudge;
    impl ModelJudge for SlowJudge {
        fn model_id(&self) -> &str {
            "slow-judge"
        }
        fn judge(&self, _subject: &Subject) -> ModelResult<ModelAnalysis> {
            std::thread::sleep(Duration::from_secs(5));
            Ok(ModelAnalysis {
                score: 0.5,
                rationale: String::new(),
                model_id: "slow-judge".to_string(),
            })
        }
    }

    struct RawExtractor;
    impl SignalExtractor for RawExtractor {
        fn name(&self) -> &str {
            "raw"
        }
        fn extract(&self, _subject: &Subject) -> Result<SignalSet> {
            // bypasses Signal::new validation on purpose
            Ok([Signal {
                name: "bad".to_string(),
                score: 2.0,
                evidence: String::new(),
            }]
            .into_iter()
            .collect())
        }
    }

    #[test]
    fn test_run_preserves_input_order() {
        let runner = EvaluationRunner::new(
            fixed_extractor(0.5),
            weights(&[("automation_marker", 1.0)]),
        );
        let examples: Vec<_> = (0..32)
            .map(|i| example(&format!("ex-{i}"), i % 2 == 0))
            .collect();
        let results = runner.run(&examples);
        assert_eq!(results.len(), 32);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.id(), format!("ex-{i}"));
        }
    }

    #[test]
    fn test_scores_without_judge_are_heuristic() {
        let runner = EvaluationRunner::new(
            fixed_extractor(0.8),
            weights(&[("automation_marker", 1.0)]),
        );
        let results = runner.run(&[example("a", true)]);
        match &results[0] {
            EvaluatedExample::Scored(scored) => {
                assert!((scored.score - 0.8).abs() < 1e-12);
                assert_eq!(scored.score, scored.heuristic_score);
                assert!(scored.model_score.is_none());
            }
            other => panic!("expected scored example, got {other:?}"),
        }
    }

    #[test]
    fn test_judge_blend_applied() {
        let runner = EvaluationRunner::new(
            fixed_extractor(0.5),
            weights(&[("automation_marker", 1.0)]),
        )
        .with_judge(Arc::new(FixedJudge::new(1.0)), 0.3);
        let results = runner.run(&[example("a", true)]);
        match &results[0] {
            EvaluatedExample::Scored(scored) => {
                assert!((scored.score - 0.65).abs() < 1e-12);
                assert_eq!(scored.heuristic_score, 0.5);
                assert_eq!(scored.model_score, Some(1.0));
            }
            other => panic!("expected scored example, got {other:?}"),
        }
    }

    #[test]
    fn test_judge_error_marks_example_failed() {
        // A model error never degrades to a heuristic-only score here;
        // the example is failed with the model's cause
        let runner = EvaluationRunner::new(
            fixed_extractor(0.9),
            weights(&[("automation_marker", 1.0)]),
        )
        .with_judge(Arc::new(FailingJudge), 0.3);
        let results = runner.run(&[example("a", true)]);
        match &results[0] {
            EvaluatedExample::Failed { error, .. } => {
                assert!(error.contains("failing-judge"), "{error}");
                assert!(error.contains("connection refused"), "{error}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_slow_judge_hits_example_timeout() {
        let runner = EvaluationRunner::new(
            fixed_extractor(0.9),
            weights(&[("automation_marker", 1.0)]),
        )
        .with_judge(Arc::new(SlowJudge), 0.3)
        .with_example_timeout(Duration::from_millis(50));
        let results = runner.run(&[example("a", true)]);
        match &results[0] {
            EvaluatedExample::Failed { error, .. } => {
                assert!(error.contains("timed out"), "{error}")
            }
            other => panic!("expected timeout failure, got {other:?}"),
        }
    }

    #[test]
    fn test_extractor_failure_is_isolated() {
        let runner = EvaluationRunner::new(Arc::new(FailingExtractor), WeightTable::default());
        let results = runner.run(&[example("a", true), example("b", false)]);
        assert_eq!(results.len(), 2);
        for result in &results {
            match result {
                EvaluatedExample::Failed { error, .. } => {
                    assert!(error.contains("boom"), "{error}")
                }
                other => panic!("expected failure, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_slow_extractor_times_out() {
        let runner = EvaluationRunner::new(Arc::new(SlowExtractor), WeightTable::default())
            .with_example_timeout(Duration::from_millis(50));
        let results = runner.run(&[example("a", true)]);
        match &results[0] {
            EvaluatedExample::Failed { error, .. } => {
                assert!(error.contains("timed out"), "{error}")
            }
            other => panic!("expected timeout failure, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_signal_is_rejected() {
        let runner = EvaluationRunner::new(Arc::new(RawExtractor), WeightTable::default());
        let results = runner.run(&[example("a", true)]);
        match &results[0] {
            EvaluatedExample::Failed { error, .. } => {
                assert!(error.contains("outside 0.0..=1.0"), "{error}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_expired_run_deadline_skips_examples() {
        let runner = EvaluationRunner::new(
            fixed_extractor(0.5),
            weights(&[("automation_marker", 1.0)]),
        )
        .with_run_timeout(Some(Duration::ZERO));
        let results = runner.run(&[example("a", true), example("b", false)]);
        for result in &results {
            assert!(matches!(result, EvaluatedExample::Skipped { .. }), "{result:?}");
        }
    }

    #[test]
    fn test_unknown_signals_score_zero() {
        // Weight table missing the emitted signal name: total weight 0
        let runner = EvaluationRunner::new(fixed_extractor(0.9), weights(&[("other", 1.0)]));
        let results = runner.run(&[example("a", true)]);
        match &results[0] {
            EvaluatedExample::Scored(scored) => assert_eq!(scored.score, 0.0),
            other => panic!("expected scored example, got {other:?}"),
        }
    }
}
