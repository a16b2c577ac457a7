//! Output reporters for scan and evaluation results
//!
//! Supports two formats:
//! - `table` - human-readable terminal output
//! - `json` - machine-readable JSON

pub mod json;
pub mod text;

use crate::model::ModelAnalysis;
use crate::models::{RiskBand, SignalSet};
use crate::scoring::WeightTable;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" | "terminal" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: table, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// One signal's share of the final score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalContribution {
    pub name: String,
    pub signal_score: f64,
    pub weight: f64,
    pub contribution: f64,
    pub evidence: String,
}

/// Model blend details shown when model-assisted scanning was used
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanModelBlend {
    pub model: String,
    pub model_score: f64,
    pub model_weight: f64,
    pub rationale: String,
}

/// The scan command's output artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub repo_path: String,
    /// Final score after optional model blending
    pub score: f64,
    pub score_100: f64,
    pub risk_band: RiskBand,
    pub heuristic_score: f64,
    /// Per-signal contributions, largest first
    pub signals: Vec<SignalContribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ScanModelBlend>,
}

impl ScanReport {
    pub fn new(
        repo_path: &Path,
        signals: &SignalSet,
        weights: &WeightTable,
        heuristic_score: f64,
        final_score: f64,
    ) -> Self {
        let mut contributions: Vec<SignalContribution> = signals
            .signals()
            .iter()
            .map(|signal| {
                let weight = weights.get(&signal.name);
                SignalContribution {
                    name: signal.name.clone(),
                    signal_score: signal.score,
                    weight,
                    contribution: signal.score * weight,
                    evidence: signal.evidence.clone(),
                }
            })
            .collect();
        contributions.sort_by(|a, b| {
            b.contribution
                .partial_cmp(&a.contribution)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Self {
            repo_path: repo_path.display().to_string(),
            score: final_score,
            score_100: final_score * 100.0,
            risk_band: RiskBand::from_score(final_score),
            heuristic_score,
            signals: contributions,
            model: None,
        }
    }

    pub fn with_model_blend(mut self, analysis: &ModelAnalysis, model_weight: f64) -> Self {
        self.model = Some(ScanModelBlend {
            model: analysis.model_id.clone(),
            model_score: analysis.score,
            model_weight,
            rationale: analysis.rationale.clone(),
        });
        self
    }
}
