//! CLI command definitions and handlers

mod eval;
mod init;
mod scan;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// Residue - agent-generated code detection
///
/// 100% LOCAL by default - model-assisted scoring is opt-in.
#[derive(Parser, Debug)]
#[command(name = "residue")]
#[command(
    version,
    about = "Estimate whether a commit or PR was produced by a coding agent",
    long_about = "Residue inspects a repository's recent history for the traces coding \
agents leave behind — automation trailers, templated commit subjects, single-author \
bursts — and combines them into a calibrated 0-1 score.\n\n\
Heuristic scoring is 100% LOCAL. Model-assisted scoring (--use-model) is opt-in and \
talks to any OpenAI-compatible endpoint.",
    after_help = "\
Examples:
  residue scan .                          Score the current repository
  residue scan . --format json            JSON output for scripting
  residue scan . --use-model --model qwen2.5-coder   Blend in a local model verdict
  residue eval --dataset eval/examples.jsonl          Run the evaluation harness
  residue eval --dataset eval/examples.jsonl --config residue.eval.toml
  residue init .                          Write starter config files

Documentation: https://github.com/residue-dev/residue"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel workers (1-64)
    #[arg(long, global = true, default_value = "8", value_parser = parse_workers)]
    pub workers: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score one repository for agent-generated residue
    #[command(after_help = "\
Examples:
  residue scan .                                     Score the current directory
  residue scan /path/to/repo --max-commits 120       Look further back in history
  residue scan . --format json -o report.json        Machine-readable report
  residue scan . --weights weights.json              Custom signal weights
  residue scan . --use-model --model llama3.1        Blend a local Ollama verdict")]
    Scan {
        /// Path to the repository (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format: table, json
        #[arg(long, short = 'f', default_value = "table", value_parser = ["table", "json"])]
        format: String,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Commits of recent history to inspect
        #[arg(long, default_value = "60")]
        max_commits: usize,

        /// Signal weights JSON file (default: built-in weights)
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Blend in a model verdict (falls back to heuristic-only on model errors)
        #[arg(long)]
        use_model: bool,

        /// Model identifier for --use-model
        #[arg(long, default_value = "qwen2.5-coder")]
        model: String,

        /// OpenAI-compatible chat-completions URL (default: local Ollama)
        #[arg(long)]
        endpoint: Option<String>,

        /// Environment variable holding the API key, if the endpoint needs one
        #[arg(long)]
        api_key_env: Option<String>,

        /// Blend weight for the model score, in [0, 1]
        #[arg(long, default_value = "0.3")]
        model_weight: f64,
    },

    /// Evaluate the scorer against a labeled dataset and check release gates
    ///
    /// Exit code is 0 only when both the regression gate and the launch gate
    /// pass, so `residue eval` can block a CI pipeline directly.
    #[command(after_help = "\
Examples:
  residue eval --dataset eval/examples.jsonl                 Heuristic-only evaluation
  residue eval --dataset eval/examples.jsonl --config residue.eval.toml
  residue eval --dataset eval/examples.jsonl --format json -o report.json
  residue eval --dataset eval/examples.jsonl --weights weights.json")]
    Eval {
        /// Labeled dataset, one JSON example per line
        #[arg(long)]
        dataset: PathBuf,

        /// Evaluation config TOML (thresholds, gates, model settings)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Signal weights JSON file (default: built-in weights)
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Output format: table, json
        #[arg(long, short = 'f', default_value = "table", value_parser = ["table", "json"])]
        format: String,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Disable the progress bar (cleaner for CI logs)
        #[arg(long)]
        no_progress: bool,
    },

    /// Write starter config files (eval config, weights, dataset template)
    Init {
        /// Directory to initialize (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scan {
            path,
            format,
            output,
            max_commits,
            weights,
            use_model,
            model,
            endpoint,
            api_key_env,
            model_weight,
        } => scan::run(scan::ScanArgs {
            path,
            format,
            output,
            max_commits,
            weights,
            use_model,
            model,
            endpoint,
            api_key_env,
            model_weight,
        }),

        Commands::Eval {
            dataset,
            config,
            weights,
            format,
            output,
            no_progress,
        } => eval::run(eval::EvalArgs {
            dataset,
            config,
            weights,
            format,
            output,
            no_progress,
            workers: cli.workers,
        }),

        Commands::Init { path } => init::run(&path),
    }
}
