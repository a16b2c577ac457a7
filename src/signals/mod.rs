//! Residue signal extraction
//!
//! Extractors inspect a subject (commit history / PR artifacts) and emit a
//! `SignalSet`. The scoring and evaluation pipeline never looks at
//! repository content itself; extractors are the only seam that does.
//!
//! The baseline `GitResidueExtractor` ships deliberately small heuristics —
//! clients are expected to swap in richer extraction logic behind the same
//! trait. Tests use `FixedExtractor`.

mod git_residue;

pub use git_residue::GitResidueExtractor;

use crate::models::{SignalSet, Subject};
use anyhow::Result;

/// Trait for residue signal extractors
///
/// Implementations may perform file or network I/O; the evaluation runner
/// wraps calls in a per-example timeout. `Send + Sync` because examples are
/// evaluated in parallel.
pub trait SignalExtractor: Send + Sync {
    /// Extractor name used in logs and failure reports
    fn name(&self) -> &str;

    /// Produce the signal set for one subject.
    ///
    /// Errors are isolated to the subject: during evaluation the example is
    /// recorded as failed, the run continues.
    fn extract(&self, subject: &Subject) -> Result<SignalSet>;
}

/// Deterministic extractor returning a fixed signal set, for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct FixedExtractor {
    signals: SignalSet,
}

impl FixedExtractor {
    pub fn new(signals: SignalSet) -> Self {
        Self { signals }
    }
}

impl SignalExtractor for FixedExtractor {
    fn name(&self) -> &str {
        "fixed"
    }

    fn extract(&self, _subject: &Subject) -> Result<SignalSet> {
        Ok(self.signals.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Signal;

    #[test]
    fn test_fixed_extractor_returns_configured_signals() {
        let set: SignalSet = [Signal::new("automation_marker", 0.2, "fixture").unwrap()]
            .into_iter()
            .collect();
        let extractor = FixedExtractor::new(set);
        let result = extractor
            .extract(&Subject::new("/does/not/matter"))
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.signals()[0].name, "automation_marker");
    }
}
