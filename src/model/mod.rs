//! Model-assisted residue scoring
//!
//! An external model can contribute a second opinion on a subject; the
//! pipeline blends it with the heuristic score via `scoring::blend`. The
//! model sits behind the `ModelJudge` capability trait so the evaluation
//! harness can substitute a deterministic stub in tests and CI never
//! depends on a live endpoint.

mod http;

pub use http::{HttpModelJudge, ModelBackend};

use crate::models::Subject;
use thiserror::Error;

/// Errors from a model judge invocation
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    RequestFailed(String),

    #[error("Model API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Model returned no parsable JSON verdict: {0}")]
    UnparsableVerdict(String),

    #[error("Missing API key: {0} not set")]
    MissingApiKey(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// A model's estimate for one subject
#[derive(Debug, Clone)]
pub struct ModelAnalysis {
    /// Normalized score in [0.0, 1.0]
    pub score: f64,
    /// Short rationale for the report
    pub rationale: String,
    /// Identifier of the model that produced the score
    pub model_id: String,
}

/// Capability interface for external model scoring
pub trait ModelJudge: Send + Sync {
    /// Identifier used in logs and reports
    fn model_id(&self) -> &str;

    /// Score one subject in [0.0, 1.0].
    ///
    /// May perform network I/O; the evaluation runner wraps calls in a
    /// per-example timeout.
    fn judge(&self, subject: &Subject) -> ModelResult<ModelAnalysis>;
}

/// Deterministic judge returning a fixed score, for tests
#[derive(Debug, Clone)]
pub struct FixedJudge {
    pub score: f64,
}

impl FixedJudge {
    pub fn new(score: f64) -> Self {
        Self { score }
    }
}

impl ModelJudge for FixedJudge {
    fn model_id(&self) -> &str {
        "fixed-judge"
    }

    fn judge(&self, _subject: &Subject) -> ModelResult<ModelAnalysis> {
        Ok(ModelAnalysis {
            score: self.score,
            rationale: "fixed test verdict".to_string(),
            model_id: self.model_id().to_string(),
        })
    }
}
