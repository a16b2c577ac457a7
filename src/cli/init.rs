//! Init command - write starter config files for a new deployment

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

const EVAL_CONFIG_TEMPLATE: &str = r#"# Residue evaluation configuration
# Used by `residue eval --config residue.eval.toml`

# Score cutoffs swept by every evaluation run. The gates below reference
# these by label.
thresholds = [
    { label = "low", value = 0.3 },
    { label = "medium", value = 0.5 },
    { label = "high", value = 0.7 },
]

# Per-example budget; slower examples are reported as failed.
example_timeout_secs = 60

# Uncomment to put a deadline on the whole run; examples not started by
# then are reported as skipped.
# run_timeout_secs = 1800

# Fail the run if precision at "medium" drops more than the budget below
# the recorded baseline. Remove this section to skip the regression gate.
[regression]
baseline_precision = 0.9
precision_degradation_budget = 0.05

[launch_gate]
threshold_label = "medium"
target_precision = 0.9

[model]
enabled = false
weight = 0.3
# endpoint = "http://localhost:11434/v1/chat/completions"
# model = "qwen2.5-coder"
# api_key_env = "RESIDUE_API_KEY"
timeout_secs = 120
"#;

const WEIGHTS_TEMPLATE: &str = r#"{
  "weights": {
    "automation_marker": 0.4,
    "templated_pr_style": 0.6,
    "uniform_authorship": 0.3
  }
}
"#;

const DATASET_TEMPLATE: &str = r#"{"id": "example-positive", "subject_type": "commit", "repo_path": "/path/to/agent-written-repo", "repo_type": "oss", "agent_generated": true, "max_commits": 60}
{"id": "example-negative", "subject_type": "pr", "repo_path": "/path/to/human-written-repo", "repo_type": "internal", "agent_generated": false}
"#;

/// Run the init command
pub(super) fn run(path: &Path) -> Result<()> {
    let target = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;
    if !target.is_dir() {
        anyhow::bail!("Path is not a directory: {}", target.display());
    }

    println!("\n{} Initializing residue\n", style("»").bold());

    write_if_absent(&target.join("residue.eval.toml"), EVAL_CONFIG_TEMPLATE)?;
    write_if_absent(&target.join("weights.json"), WEIGHTS_TEMPLATE)?;

    let eval_dir = target.join("eval");
    std::fs::create_dir_all(&eval_dir)
        .with_context(|| format!("Failed to create {}", eval_dir.display()))?;
    write_if_absent(&eval_dir.join("examples.jsonl"), DATASET_TEMPLATE)?;

    println!("\n{} Initialized!", style("✓").green().bold());
    println!("\nNext steps:");
    println!("  {} Score a repository", style("residue scan .").cyan());
    println!(
        "  {} Fill in eval/examples.jsonl, then run the harness",
        style("residue eval --dataset eval/examples.jsonl --config residue.eval.toml").cyan()
    );
    Ok(())
}

fn write_if_absent(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!(
            "{} {} already exists, leaving it alone",
            style("-").dim(),
            style(path.display()).cyan()
        );
        return Ok(());
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    println!("{} Created {}", style("✓").green(), style(path.display()).cyan());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::EvalConfig;
    use crate::scoring::WeightTable;

    #[test]
    fn test_templates_parse() {
        let config: EvalConfig = toml::from_str(EVAL_CONFIG_TEMPLATE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.launch_gate.target_precision, 0.9);
        assert_eq!(
            config.regression.as_ref().unwrap().precision_degradation_budget,
            0.05
        );

        for line in DATASET_TEMPLATE.lines() {
            let _: crate::models::LabeledExample = serde_json::from_str(line).unwrap();
        }
    }

    #[test]
    fn test_init_writes_files_once() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path()).unwrap();
        assert!(dir.path().join("residue.eval.toml").exists());
        assert!(dir.path().join("eval/examples.jsonl").exists());

        let table = WeightTable::load(&dir.path().join("weights.json")).unwrap();
        assert_eq!(table.get("templated_pr_style"), 0.6);

        // Second run must not clobber user edits
        std::fs::write(dir.path().join("weights.json"), "{\"weights\":{}}").unwrap();
        run(dir.path()).unwrap();
        let content = std::fs::read_to_string(dir.path().join("weights.json")).unwrap();
        assert_eq!(content, "{\"weights\":{}}");
    }
}
