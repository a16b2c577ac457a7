//! Weighted residue scoring
//!
//! This module turns a set of normalized signals into one risk score.
//! The aggregate is a weighted arithmetic mean, not a sum:
//!
//! ```text
//! score = Σ (signal.score × weight) / Σ weight
//! ```
//!
//! with the total-applied-weight-zero case defined as 0.0. Given signal
//! scores in [0, 1] and non-negative weights the result stays in [0, 1],
//! so the score is directly comparable against configured thresholds.
//!
//! Model-assisted scoring is a separate linear blend (`blend`) layered on
//! top, so the heuristic scorer stays deterministic whether or not a model
//! is in play.

mod weights;

pub use weights::WeightTable;

use crate::models::{RiskBand, SignalSet};

/// Aggregate a signal set into a risk score in [0.0, 1.0].
///
/// Signals whose name is absent from the weight table resolve to the
/// table's default weight (0.0 unless configured otherwise): they do not
/// move the score but still appear in reports. Duplicate names each
/// contribute their own weighted term (see `SignalSet`).
pub fn score(signals: &SignalSet, weights: &WeightTable) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for signal in signals.signals() {
        let weight = weights.get(&signal.name);
        weighted_sum += signal.score * weight;
        weight_total += weight;
    }

    if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        0.0
    }
}

/// Linearly blend a heuristic score with an external model score.
///
/// `model_weight` 0.0 returns the heuristic score exactly, 1.0 returns the
/// model score exactly. Callers validate the weight range at configuration
/// load time.
pub fn blend(heuristic_score: f64, model_score: f64, model_weight: f64) -> f64 {
    heuristic_score * (1.0 - model_weight) + model_score * model_weight
}

/// Map a final score to a human-facing risk band
pub fn band(score: f64) -> RiskBand {
    RiskBand::from_score(score)
}
