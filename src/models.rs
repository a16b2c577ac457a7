//! Core data models for residue detection
//!
//! These models are shared by the scan path (one subject, one score) and
//! the evaluation path (many labeled subjects, aggregate metrics).

use crate::error::{ResidueError, ResidueResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of recent commits an extractor inspects per subject.
pub const DEFAULT_MAX_COMMITS: usize = 60;

/// What kind of artifact a subject is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    #[default]
    Commit,
    Pr,
}

impl std::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubjectType::Commit => write!(f, "commit"),
            SubjectType::Pr => write!(f, "pr"),
        }
    }
}

/// A commit/PR to be scored, as handed to extractors and model judges
#[derive(Debug, Clone)]
pub struct Subject {
    pub subject_type: SubjectType,
    /// Path to the repository (or any subdirectory inside it)
    pub repo_path: PathBuf,
    /// Bound on how far back in history extractors may look
    pub max_commits: usize,
}

impl Subject {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            subject_type: SubjectType::Commit,
            repo_path: repo_path.into(),
            max_commits: DEFAULT_MAX_COMMITS,
        }
    }

    pub fn with_subject_type(mut self, subject_type: SubjectType) -> Self {
        self.subject_type = subject_type;
        self
    }

    pub fn with_max_commits(mut self, max_commits: usize) -> Self {
        self.max_commits = max_commits;
        self
    }
}

/// One named residue measurement with supporting evidence
///
/// Immutable once produced by an extractor. The score is normalized to
/// [0.0, 1.0]; anything outside that range is a data error at extraction
/// time, never clamped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub score: f64,
    /// Human-readable justification, may be empty
    #[serde(default)]
    pub evidence: String,
}

impl Signal {
    /// Create a signal, rejecting scores outside [0.0, 1.0]
    pub fn new(
        name: impl Into<String>,
        score: f64,
        evidence: impl Into<String>,
    ) -> ResidueResult<Self> {
        let name = name.into();
        if !(0.0..=1.0).contains(&score) || score.is_nan() {
            return Err(ResidueError::SignalOutOfRange { name, score });
        }
        Ok(Self {
            name,
            score,
            evidence: evidence.into(),
        })
    }
}

/// Ordered sequence of signals for one subject.
///
/// Duplicate names are allowed: each occurrence contributes independently
/// to the weighted mean, i.e. a duplicated name adds its weight to the
/// denominator once per occurrence. This matches treating every emitted
/// measurement as its own observation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalSet {
    signals: Vec<Signal>,
}

impl SignalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, signal: Signal) {
        self.signals.push(signal);
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }
}

impl FromIterator<Signal> for SignalSet {
    fn from_iter<I: IntoIterator<Item = Signal>>(iter: I) -> Self {
        Self {
            signals: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for SignalSet {
    type Item = Signal;
    type IntoIter = std::vec::IntoIter<Signal>;

    fn into_iter(self) -> Self::IntoIter {
        self.signals.into_iter()
    }
}

/// Risk bands for human-facing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    /// Band boundaries: low < 0.3 <= medium < 0.7 <= high
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            RiskBand::High
        } else if score >= 0.3 {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskBand::Low => write!(f, "low"),
            RiskBand::Medium => write!(f, "medium"),
            RiskBand::High => write!(f, "high"),
        }
    }
}

fn default_repo_type() -> String {
    "unknown".to_string()
}

fn default_max_commits() -> usize {
    DEFAULT_MAX_COMMITS
}

/// A ground-truth labeled example used for detector evaluation
///
/// One JSONL record per line; `residue init` writes a template showing the
/// expected field set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledExample {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub subject_type: SubjectType,
    pub repo_path: PathBuf,
    /// Free-text grouping label, used only for the FPR breakdown
    #[serde(default = "default_repo_type")]
    pub repo_type: String,
    pub agent_generated: bool,
    #[serde(default = "default_max_commits")]
    pub max_commits: usize,
}

impl LabeledExample {
    pub fn subject(&self) -> Subject {
        Subject {
            subject_type: self.subject_type,
            repo_path: self.repo_path.clone(),
            max_commits: self.max_commits,
        }
    }
}

/// A labeled example plus its computed scores
///
/// Predictions are derived per threshold during metric computation, never
/// stored here, so one scored example serves the whole threshold sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredExample {
    #[serde(flatten)]
    pub example: LabeledExample,
    /// Final score after optional model blending
    pub score: f64,
    pub heuristic_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_rejects_out_of_range() {
        assert!(Signal::new("x", -0.1, "").is_err());
        assert!(Signal::new("x", 1.01, "").is_err());
        assert!(Signal::new("x", f64::NAN, "").is_err());
        assert!(Signal::new("x", 0.0, "").is_ok());
        assert!(Signal::new("x", 1.0, "").is_ok());
    }

    #[test]
    fn test_risk_band_boundaries() {
        assert_eq!(RiskBand::from_score(0.0), RiskBand::Low);
        assert_eq!(RiskBand::from_score(0.29), RiskBand::Low);
        assert_eq!(RiskBand::from_score(0.3), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(0.69), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(0.7), RiskBand::High);
        assert_eq!(RiskBand::from_score(1.0), RiskBand::High);
    }

    #[test]
    fn test_labeled_example_defaults() {
        let json = r#"{"repo_path": "/tmp/repo", "agent_generated": true}"#;
        let example: LabeledExample = serde_json::from_str(json).unwrap();
        assert_eq!(example.repo_type, "unknown");
        assert_eq!(example.max_commits, DEFAULT_MAX_COMMITS);
        assert_eq!(example.subject_type, SubjectType::Commit);
        assert!(example.agent_generated);
    }

    #[test]
    fn test_subject_type_serde_lowercase() {
        assert_eq!(serde_json::to_string(&SubjectType::Pr).unwrap(), "\"pr\"");
        let parsed: SubjectType = serde_json::from_str("\"commit\"").unwrap();
        assert_eq!(parsed, SubjectType::Commit);
    }
}
