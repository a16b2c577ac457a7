//! Regression and launch gates
//!
//! Gates are pure numeric comparisons over the precision observed at the
//! launch-gate threshold (the one named by `launch_gate.threshold_label`,
//! "medium" by default). A failing gate is a verdict carried in the
//! report, not an error; the CLI maps the AND of both verdicts to the
//! process exit status.

use super::config::{LaunchGateConfig, RegressionConfig};
use serde::{Deserialize, Serialize};

/// Regression check: precision may not drop more than the budget below
/// the recorded baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionVerdict {
    pub passed: bool,
    /// None when no baseline is configured (gate passes trivially)
    pub baseline_precision: Option<f64>,
    pub precision_degradation_budget: Option<f64>,
    pub min_allowed_precision: Option<f64>,
    pub observed_precision: f64,
}

/// Launch check: precision at the named threshold must meet the target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchVerdict {
    pub passed: bool,
    pub threshold_label: String,
    pub target_precision: f64,
    pub observed_precision: f64,
}

/// Fails when `observed < baseline - budget`. Without a configured
/// baseline the verdict passes and records that no comparison happened.
pub fn check_regression(
    config: Option<&RegressionConfig>,
    observed_precision: f64,
) -> RegressionVerdict {
    match config {
        Some(regression) => {
            let min_allowed =
                regression.baseline_precision - regression.precision_degradation_budget;
            RegressionVerdict {
                passed: observed_precision >= min_allowed,
                baseline_precision: Some(regression.baseline_precision),
                precision_degradation_budget: Some(regression.precision_degradation_budget),
                min_allowed_precision: Some(min_allowed),
                observed_precision,
            }
        }
        None => RegressionVerdict {
            passed: true,
            baseline_precision: None,
            precision_degradation_budget: None,
            min_allowed_precision: None,
            observed_precision,
        },
    }
}

/// Fails when observed precision is below the configured target
pub fn check_launch(config: &LaunchGateConfig, observed_precision: f64) -> LaunchVerdict {
    LaunchVerdict {
        passed: observed_precision >= config.target_precision,
        threshold_label: config.threshold_label.clone(),
        target_precision: config.target_precision,
        observed_precision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regression(baseline: f64, budget: f64) -> RegressionConfig {
        RegressionConfig {
            baseline_precision: baseline,
            precision_degradation_budget: budget,
        }
    }

    #[test]
    fn test_regression_budget_boundary() {
        let config = regression(0.9, 0.05);
        assert!(!check_regression(Some(&config), 0.84).passed);
        assert!(check_regression(Some(&config), 0.86).passed);
        // Exactly at the floor still passes
        assert!(check_regression(Some(&config), 0.85).passed);
    }

    #[test]
    fn test_regression_without_baseline_passes() {
        let verdict = check_regression(None, 0.0);
        assert!(verdict.passed);
        assert!(verdict.baseline_precision.is_none());
        assert_eq!(verdict.observed_precision, 0.0);
    }

    #[test]
    fn test_regression_records_floor() {
        let verdict = check_regression(Some(&regression(0.9, 0.05)), 0.86);
        assert_eq!(verdict.min_allowed_precision, Some(0.9 - 0.05));
    }

    #[test]
    fn test_launch_gate() {
        let config = LaunchGateConfig {
            threshold_label: "medium".to_string(),
            target_precision: 0.9,
        };
        assert!(check_launch(&config, 0.95).passed);
        assert!(check_launch(&config, 0.9).passed);
        assert!(!check_launch(&config, 0.89).passed);
        assert_eq!(check_launch(&config, 0.5).threshold_label, "medium");
    }
}
