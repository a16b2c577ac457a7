//! Classification metrics
//!
//! Pure functions over immutable `(score, label, group)` observations.
//! Every zero-denominator case is defined (as 0.0), never an error, so a
//! degenerate dataset produces a report instead of a crash — the report
//! layer is responsible for distinguishing "no positives" from "nothing
//! evaluated" via the sample counts carried alongside each rate.

use super::config::ThresholdSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One scored, labeled example as seen by the metric functions
#[derive(Debug, Clone)]
pub struct Observation {
    pub score: f64,
    pub agent_generated: bool,
    /// Grouping key for the FPR breakdown (repo_type)
    pub group: String,
}

/// Counts of prediction outcomes at one threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    #[serde(rename = "tp")]
    pub true_positives: usize,
    #[serde(rename = "fp")]
    pub false_positives: usize,
    #[serde(rename = "tn")]
    pub true_negatives: usize,
    #[serde(rename = "fn")]
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }
}

/// Derived rates at one threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub false_positive_rate: f64,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl Metrics {
    pub fn from_matrix(m: &ConfusionMatrix) -> Self {
        let precision = ratio(m.true_positives, m.true_positives + m.false_positives);
        let recall = ratio(m.true_positives, m.true_positives + m.false_negatives);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        let false_positive_rate =
            ratio(m.false_positives, m.false_positives + m.true_negatives);
        Self {
            precision,
            recall,
            f1,
            false_positive_rate,
        }
    }
}

/// False-positive rate within one group, with its negative sample size.
///
/// `negatives == 0` makes the rate 0.0 by definition; the sample size is
/// reported so a zero from "no negatives observed" is distinguishable from
/// a confident zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupFpr {
    pub negatives: usize,
    pub false_positives: usize,
    pub fpr: f64,
}

/// Count prediction outcomes at a threshold (predicted = score >= threshold)
pub fn confusion_matrix(observations: &[Observation], threshold: f64) -> ConfusionMatrix {
    let mut matrix = ConfusionMatrix::default();
    for obs in observations {
        let predicted = obs.score >= threshold;
        match (predicted, obs.agent_generated) {
            (true, true) => matrix.true_positives += 1,
            (true, false) => matrix.false_positives += 1,
            (false, false) => matrix.true_negatives += 1,
            (false, true) => matrix.false_negatives += 1,
        }
    }
    matrix
}

/// FPR restricted to each observed group value.
///
/// Every group seen in the input gets an entry, including groups with no
/// negative examples (their rate is 0.0 with `negatives: 0`).
pub fn fpr_by_group(observations: &[Observation], threshold: f64) -> BTreeMap<String, GroupFpr> {
    let mut groups: BTreeMap<String, GroupFpr> = BTreeMap::new();
    for obs in observations {
        let entry = groups.entry(obs.group.clone()).or_default();
        if obs.agent_generated {
            continue;
        }
        entry.negatives += 1;
        if obs.score >= threshold {
            entry.false_positives += 1;
        }
    }
    for group in groups.values_mut() {
        group.fpr = ratio(group.false_positives, group.negatives);
    }
    groups
}

/// Full metric set at one labeled threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdReport {
    pub label: String,
    pub threshold: f64,
    pub confusion_matrix: ConfusionMatrix,
    pub metrics: Metrics,
    pub fpr_by_repo_type: BTreeMap<String, GroupFpr>,
}

/// Compute one independent metric set per configured threshold
pub fn sweep(observations: &[Observation], thresholds: &[ThresholdSpec]) -> Vec<ThresholdReport> {
    thresholds
        .iter()
        .map(|spec| {
            let matrix = confusion_matrix(observations, spec.value);
            ThresholdReport {
                label: spec.label.clone(),
                threshold: spec.value,
                metrics: Metrics::from_matrix(&matrix),
                confusion_matrix: matrix,
                fpr_by_repo_type: fpr_by_group(observations, spec.value),
            }
        })
        .collect()
}
