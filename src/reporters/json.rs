//! JSON reporter
//!
//! Pretty-printed JSON for machine consumption, piping to jq, or archival
//! alongside CI artifacts.

use super::ScanReport;
use crate::eval::EvaluationReport;
use anyhow::Result;

/// Render a scan report as JSON
pub fn render_scan(report: &ScanReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Render an evaluation report as JSON
pub fn render_eval(report: &EvaluationReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
