//! Table (terminal) reporter

use super::ScanReport;
use crate::eval::EvaluationReport;
use anyhow::Result;
use console::style;

fn verdict_tag(passed: bool) -> String {
    if passed {
        style("PASS").green().bold().to_string()
    } else {
        style("FAIL").red().bold().to_string()
    }
}

fn shorten(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{truncated}…")
}

/// Render a scan report as a terminal table
pub fn render_scan(report: &ScanReport) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!(
        "Residue scan: {}\nLikely agent-generated score: {:.3} ({:.1}/100, {})\n",
        report.repo_path,
        report.score,
        report.score_100,
        report.risk_band
    ));
    if let Some(model) = &report.model {
        out.push_str(&format!(
            "Model blend: heuristic={:.3}, model={:.3} (weight {:.2}, {}), final={:.3}\n",
            report.heuristic_score, model.model_score, model.model_weight, model.model, report.score
        ));
    }

    out.push_str("\n| Signal | Score | Weight | Contribution | Evidence |\n");
    out.push_str("|---|---:|---:|---:|---|\n");
    for signal in &report.signals {
        out.push_str(&format!(
            "| {} | {:.3} | {:.3} | {:.3} | {} |\n",
            signal.name,
            signal.signal_score,
            signal.weight,
            signal.contribution,
            shorten(&signal.evidence, 58)
        ));
    }
    Ok(out)
}

/// Render an evaluation report as terminal output
pub fn render_eval(report: &EvaluationReport) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!(
        "Residue evaluation — {} examples ({} evaluated, {} failed, {} skipped)\n\n",
        report.example_count, report.evaluated, report.failed, report.skipped
    ));

    out.push_str("| Threshold | Value | TP | FP | TN | FN | Precision | Recall | F1 | FPR |\n");
    out.push_str("|---|---:|---:|---:|---:|---:|---:|---:|---:|---:|\n");
    for t in &report.sweep {
        let m = &t.confusion_matrix;
        out.push_str(&format!(
            "| {} | {:.2} | {} | {} | {} | {} | {:.3} | {:.3} | {:.3} | {:.3} |\n",
            t.label,
            t.threshold,
            m.true_positives,
            m.false_positives,
            m.true_negatives,
            m.false_negatives,
            t.metrics.precision,
            t.metrics.recall,
            t.metrics.f1,
            t.metrics.false_positive_rate
        ));
    }

    // FPR breakdown at the gate threshold
    if let Some(gate_threshold) = report.gate_threshold_report() {
        if !gate_threshold.fpr_by_repo_type.is_empty() {
            out.push_str(&format!(
                "\nFPR by repo type at '{}':\n",
                gate_threshold.label
            ));
            for (group, fpr) in &gate_threshold.fpr_by_repo_type {
                out.push_str(&format!(
                    "  {group}: {:.3} ({} FP / {} negatives)\n",
                    fpr.fpr, fpr.false_positives, fpr.negatives
                ));
            }
        }
    }

    if !report.failures.is_empty() {
        out.push_str(&format!(
            "\n{} example(s) failed to evaluate (excluded from metrics):\n",
            report.failures.len()
        ));
        for failure in &report.failures {
            out.push_str(&format!("  {}: {}\n", failure.id, shorten(&failure.error, 100)));
        }
    }

    out.push('\n');
    match report.regression.baseline_precision {
        Some(baseline) => out.push_str(&format!(
            "Regression gate: {} (observed {:.3}, baseline {:.3}, budget {:.3})\n",
            verdict_tag(report.regression.passed),
            report.regression.observed_precision,
            baseline,
            report.regression.precision_degradation_budget.unwrap_or(0.0)
        )),
        None => out.push_str(&format!(
            "Regression gate: {} (no baseline configured)\n",
            verdict_tag(report.regression.passed)
        )),
    }
    out.push_str(&format!(
        "Launch gate:     {} (precision {:.3} at '{}', target {:.3})\n",
        verdict_tag(report.launch_gate.passed),
        report.launch_gate.observed_precision,
        report.launch_gate.threshold_label,
        report.launch_gate.target_precision
    ));
    Ok(out)
}
