//! Eval command - run the harness over a labeled dataset and gate on the result

use crate::eval::{self, EvalConfig, EvaluationRunner};
use crate::model::{HttpModelJudge, ModelBackend, ModelJudge};
use crate::reporters::{self, OutputFormat};
use crate::scoring::WeightTable;
use crate::signals::{GitResidueExtractor, SignalExtractor};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub(super) struct EvalArgs {
    pub dataset: PathBuf,
    pub config: Option<PathBuf>,
    pub weights: Option<PathBuf>,
    pub format: String,
    pub output: Option<PathBuf>,
    pub no_progress: bool,
    pub workers: usize,
}

/// Run the eval command; exits with code 1 when a release gate fails
pub(super) fn run(args: EvalArgs) -> Result<()> {
    let format = OutputFormat::from_str(&args.format)?;
    let config = EvalConfig::load_or_default(args.config.as_deref())?;
    let weights = WeightTable::load_or_default(args.weights.as_deref())?;
    let examples = eval::load_examples(&args.dataset)?;

    let extractor: Arc<dyn SignalExtractor> = Arc::new(GitResidueExtractor::new());
    let mut runner = EvaluationRunner::new(extractor, weights)
        .with_timeouts_from(&config)
        .with_progress(!args.no_progress && format == OutputFormat::Table);

    let mut model_id = None;
    if config.model.enabled {
        let judge = build_judge(&config)?;
        model_id = Some(judge.model_id().to_string());
        runner = runner.with_judge(Arc::from(judge), config.model.weight);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.workers)
        .build()
        .context("Failed to build worker pool")?;
    let outcomes = pool.install(|| runner.run(&examples));

    let report = eval::build_report(&config, model_id.as_deref(), outcomes);
    let rendered = match format {
        OutputFormat::Table => reporters::text::render_eval(&report)?,
        OutputFormat::Json => reporters::json::render_eval(&report)?,
    };
    super::scan::write_output(&rendered, args.output.as_deref())?;

    if !report.passed() {
        eprintln!("Failing due to gate verdicts (see report)");
        std::process::exit(1);
    }
    Ok(())
}

/// Build the HTTP judge from `[model]` config; strict, unlike scan
fn build_judge(config: &EvalConfig) -> Result<Box<dyn ModelJudge>> {
    let model = config
        .model
        .model
        .clone()
        .context("[model] enabled = true requires a model identifier")?;
    let mut backend = match &config.model.endpoint {
        Some(endpoint) => ModelBackend {
            endpoint: endpoint.clone(),
            model,
            api_key: None,
        },
        None => ModelBackend::ollama(model),
    };
    if let Some(env_var) = &config.model.api_key_env {
        backend = backend.with_key_from_env(env_var)?;
    }
    Ok(Box::new(HttpModelJudge::with_timeout(
        backend,
        Duration::from_secs(config.model.timeout_secs),
    )))
}
