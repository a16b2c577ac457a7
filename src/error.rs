//! Error taxonomy for scoring and evaluation
//!
//! Configuration and data-shape errors abort a run before any scoring
//! happens. Per-example extraction/model failures are *not* represented
//! here — they are recorded as data on the evaluation report (see
//! `eval::runner::EvaluatedExample`), and gate failures are verdicts,
//! not errors.

use thiserror::Error;

/// Errors that invalidate a configuration or an input artifact
#[derive(Error, Debug)]
pub enum ResidueError {
    #[error("Signal '{name}' has score {score}, expected 0.0..=1.0")]
    SignalOutOfRange { name: String, score: f64 },

    #[error("Weight for signal '{name}' is {weight}, weights must be >= 0.0")]
    InvalidWeight { name: String, weight: f64 },

    #[error("Threshold '{label}' has value {value}, expected 0.0..=1.0")]
    InvalidThreshold { label: String, value: f64 },

    #[error("Launch gate references threshold label '{0}' which is not in the configured threshold list")]
    UnknownThresholdLabel(String),

    #[error("Model blend weight is {0}, expected 0.0..=1.0")]
    InvalidModelWeight(f64),

    #[error("Invalid gate configuration: {0}")]
    InvalidGateConfig(String),

    #[error("Failed to parse weight table: {0}")]
    WeightParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ResidueResult<T> = Result<T, ResidueError>;
