//! Labeled dataset loading
//!
//! Datasets are JSONL: one `LabeledExample` object per line, blank lines
//! ignored. Records without an `id` get a synthesized `example-N` id based
//! on their 1-indexed line position, so failure reports can always point
//! at a concrete record.

use crate::models::LabeledExample;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Load labeled examples from a JSONL file
pub fn load_examples(path: &Path) -> Result<Vec<LabeledExample>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;

    let mut examples = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut example: LabeledExample = serde_json::from_str(line).with_context(|| {
            format!("Malformed example on line {} of {}", line_no + 1, path.display())
        })?;
        if example.id.is_empty() {
            example.id = format!("example-{}", line_no + 1);
        }
        examples.push(example);
    }
    debug!(count = examples.len(), path = %path.display(), "loaded labeled examples");
    Ok(examples)
}
