//! Evaluation configuration
//!
//! Loaded from a TOML file; every recognized option has a default so the
//! harness runs with an empty config. All range checks happen in
//! `validate()` before any example is scored — a bad threshold or gate
//! parameter aborts the run up front.

use crate::error::{ResidueError, ResidueResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default blend weight given to the model score when enabled
pub const DEFAULT_MODEL_WEIGHT: f64 = 0.3;

/// One labeled score cutoff
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdSpec {
    pub label: String,
    pub value: f64,
}

impl ThresholdSpec {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

fn default_thresholds() -> Vec<ThresholdSpec> {
    vec![
        ThresholdSpec::new("low", 0.3),
        ThresholdSpec::new("medium", 0.5),
        ThresholdSpec::new("high", 0.7),
    ]
}

/// Precision regression budget against a recorded baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionConfig {
    pub baseline_precision: f64,
    pub precision_degradation_budget: f64,
}

fn default_threshold_label() -> String {
    "medium".to_string()
}

fn default_target_precision() -> f64 {
    0.9
}

/// Minimum precision required at a named threshold before deploying
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchGateConfig {
    #[serde(default = "default_threshold_label")]
    pub threshold_label: String,
    #[serde(default = "default_target_precision")]
    pub target_precision: f64,
}

impl Default for LaunchGateConfig {
    fn default() -> Self {
        Self {
            threshold_label: default_threshold_label(),
            target_precision: default_target_precision(),
        }
    }
}

fn default_model_weight() -> f64 {
    DEFAULT_MODEL_WEIGHT
}

fn default_model_timeout_secs() -> u64 {
    120
}

/// Model-assisted scoring settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Blend weight for the model score, in [0, 1]
    #[serde(default = "default_model_weight")]
    pub weight: f64,
    /// OpenAI-compatible chat-completions URL
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Environment variable holding the bearer token, if any
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_model_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            weight: default_model_weight(),
            endpoint: None,
            model: None,
            api_key_env: None,
            timeout_secs: default_model_timeout_secs(),
        }
    }
}

fn default_example_timeout_secs() -> u64 {
    60
}

/// Full evaluation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<ThresholdSpec>,
    #[serde(default)]
    pub regression: Option<RegressionConfig>,
    #[serde(default)]
    pub launch_gate: LaunchGateConfig,
    #[serde(default)]
    pub model: ModelConfig,
    /// Per-example extraction/model budget; a slower example is marked failed
    #[serde(default = "default_example_timeout_secs")]
    pub example_timeout_secs: u64,
    /// Whole-run deadline; examples not yet started are reported as skipped
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            thresholds: default_thresholds(),
            regression: None,
            launch_gate: LaunchGateConfig::default(),
            model: ModelConfig::default(),
            example_timeout_secs: default_example_timeout_secs(),
            run_timeout_secs: None,
        }
    }
}

impl EvalConfig {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read eval config {}", path.display()))?;
        let config: EvalConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse eval config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a path if given, otherwise validated defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Range-check every configured value; called before any scoring
    pub fn validate(&self) -> ResidueResult<()> {
        if self.thresholds.is_empty() {
            return Err(ResidueError::InvalidGateConfig(
                "threshold list is empty".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for spec in &self.thresholds {
            if !(0.0..=1.0).contains(&spec.value) || spec.value.is_nan() {
                return Err(ResidueError::InvalidThreshold {
                    label: spec.label.clone(),
                    value: spec.value,
                });
            }
            // Gates address thresholds by label; a duplicate would make the
            // gated threshold ambiguous
            if !seen.insert(spec.label.as_str()) {
                return Err(ResidueError::InvalidGateConfig(format!(
                    "duplicate threshold label '{}'",
                    spec.label
                )));
            }
        }
        if self.threshold(&self.launch_gate.threshold_label).is_none() {
            return Err(ResidueError::UnknownThresholdLabel(
                self.launch_gate.threshold_label.clone(),
            ));
        }
        if !(0.0..=1.0).contains(&self.launch_gate.target_precision) {
            return Err(ResidueError::InvalidGateConfig(format!(
                "launch_gate.target_precision {} not in 0.0..=1.0",
                self.launch_gate.target_precision
            )));
        }
        if let Some(regression) = &self.regression {
            if regression.precision_degradation_budget < 0.0 {
                return Err(ResidueError::InvalidGateConfig(format!(
                    "regression.precision_degradation_budget {} must be >= 0.0",
                    regression.precision_degradation_budget
                )));
            }
            if !(0.0..=1.0).contains(&regression.baseline_precision) {
                return Err(ResidueError::InvalidGateConfig(format!(
                    "regression.baseline_precision {} not in 0.0..=1.0",
                    regression.baseline_precision
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.model.weight) || self.model.weight.is_nan() {
            return Err(ResidueError::InvalidModelWeight(self.model.weight));
        }
        Ok(())
    }

    /// Look up a threshold by its label
    pub fn threshold(&self, label: &str) -> Option<&ThresholdSpec> {
        self.thresholds.iter().find(|t| t.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EvalConfig::default();
        config.validate().unwrap();
        assert_eq!(config.launch_gate.threshold_label, "medium");
        assert_eq!(config.launch_gate.target_precision, 0.9);
        assert_eq!(config.model.weight, DEFAULT_MODEL_WEIGHT);
        assert!(config.threshold("medium").is_some());
    }

    #[test]
    fn test_load_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
thresholds = [
    {{ label = "strict", value = 0.8 }},
    {{ label = "medium", value = 0.5 }},
]

[regression]
baseline_precision = 0.9
precision_degradation_budget = 0.05

[launch_gate]
target_precision = 0.85

[model]
enabled = true
weight = 0.4
endpoint = "http://localhost:11434/v1/chat/completions"
model = "test-model"
"#
        )
        .unwrap();
        let config = EvalConfig::load(file.path()).unwrap();
        assert_eq!(config.thresholds.len(), 2);
        assert_eq!(config.threshold("strict").unwrap().value, 0.8);
        assert_eq!(config.regression.as_ref().unwrap().baseline_precision, 0.9);
        assert_eq!(config.launch_gate.target_precision, 0.85);
        assert!(config.model.enabled);
        assert_eq!(config.model.weight, 0.4);
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = EvalConfig::default();
        config.thresholds.push(ThresholdSpec::new("bad", 1.5));
        assert!(matches!(
            config.validate(),
            Err(ResidueError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_threshold_labels() {
        let mut config = EvalConfig::default();
        config.thresholds.push(ThresholdSpec::new("medium", 0.6));
        match config.validate() {
            Err(ResidueError::InvalidGateConfig(message)) => {
                assert!(message.contains("medium"), "{message}")
            }
            other => panic!("expected duplicate-label rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_unknown_launch_label() {
        let mut config = EvalConfig::default();
        config.launch_gate.threshold_label = "nonexistent".to_string();
        assert!(matches!(
            config.validate(),
            Err(ResidueError::UnknownThresholdLabel(_))
        ));
    }

    #[test]
    fn test_validate_rejects_negative_budget() {
        let mut config = EvalConfig::default();
        config.regression = Some(RegressionConfig {
            baseline_precision: 0.9,
            precision_degradation_budget: -0.01,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_model_weight() {
        let mut config = EvalConfig::default();
        config.model.weight = 1.2;
        assert!(matches!(
            config.validate(),
            Err(ResidueError::InvalidModelWeight(_))
        ));
    }
}
