//! Scan command - score one repository for agent-generated residue

use crate::error::ResidueError;
use crate::model::{HttpModelJudge, ModelBackend, ModelJudge};
use crate::models::Subject;
use crate::reporters::{self, OutputFormat, ScanReport};
use crate::scoring::{self, WeightTable};
use crate::signals::{GitResidueExtractor, SignalExtractor};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

pub(super) struct ScanArgs {
    pub path: PathBuf,
    pub format: String,
    pub output: Option<PathBuf>,
    pub max_commits: usize,
    pub weights: Option<PathBuf>,
    pub use_model: bool,
    pub model: String,
    pub endpoint: Option<String>,
    pub api_key_env: Option<String>,
    pub model_weight: f64,
}

/// Run the scan command
pub(super) fn run(args: ScanArgs) -> Result<()> {
    let repo_path = args
        .path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", args.path.display()))?;
    let format = OutputFormat::from_str(&args.format)?;

    let weights = WeightTable::load_or_default(args.weights.as_deref())?;
    let subject = Subject::new(&repo_path).with_max_commits(args.max_commits);

    let extractor = GitResidueExtractor::new();
    let signals = extractor
        .extract(&subject)
        .with_context(|| format!("Failed to extract signals from {}", repo_path.display()))?;
    let heuristic_score = scoring::score(&signals, &weights);

    // Model flags are validated up front: a bad blend weight or missing
    // API key is a configuration error and aborts the scan. Only judge
    // invocation is fail-open, downgrading to heuristic-only scoring when
    // the endpoint is broken or unreachable.
    let report = if args.use_model {
        let judge = build_judge(&args)?;
        match judge.judge(&subject) {
            Ok(analysis) => {
                let final_score =
                    scoring::blend(heuristic_score, analysis.score, args.model_weight);
                ScanReport::new(&repo_path, &signals, &weights, heuristic_score, final_score)
                    .with_model_blend(&analysis, args.model_weight)
            }
            Err(error) => {
                warn!(error = %error, "model scoring unavailable, using heuristic score only");
                ScanReport::new(
                    &repo_path,
                    &signals,
                    &weights,
                    heuristic_score,
                    heuristic_score,
                )
            }
        }
    } else {
        ScanReport::new(
            &repo_path,
            &signals,
            &weights,
            heuristic_score,
            heuristic_score,
        )
    };

    let rendered = match format {
        OutputFormat::Table => reporters::text::render_scan(&report)?,
        OutputFormat::Json => reporters::json::render_scan(&report)?,
    };
    write_output(&rendered, args.output.as_deref())
}

/// Validate the model flags and build the judge.
///
/// Errors here (bad blend weight, missing API key) are configuration
/// errors and abort the scan; only `judge()` invocation failures are
/// eligible for the heuristic-only fallback.
fn build_judge(args: &ScanArgs) -> Result<HttpModelJudge> {
    if !(0.0..=1.0).contains(&args.model_weight) || args.model_weight.is_nan() {
        return Err(ResidueError::InvalidModelWeight(args.model_weight).into());
    }
    let mut backend = match &args.endpoint {
        Some(endpoint) => ModelBackend {
            endpoint: endpoint.clone(),
            model: args.model.clone(),
            api_key: None,
        },
        None => ModelBackend::ollama(&args.model),
    };
    if let Some(env_var) = &args.api_key_env {
        backend = backend.with_key_from_env(env_var)?;
    }
    Ok(HttpModelJudge::new(backend))
}

pub(super) fn write_output(rendered: &str, output: Option<&std::path::Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
