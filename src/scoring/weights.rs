//! Signal weight tables
//!
//! Weights control how much each residue signal moves the aggregate score.
//! Tables are plain name → weight maps loaded from a JSON file of shape
//! `{ "weights": { "signal_name": 0.5 } }`, or the built-in defaults.
//!
//! The fallback for names absent from the table is an explicit field on
//! the table rather than a module constant, so several tables (e.g. during
//! a weight tuning sweep) can coexist in one process without interference.

use crate::error::{ResidueError, ResidueResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// On-disk shape of a weights file
#[derive(Debug, Serialize, Deserialize)]
struct WeightsFile {
    #[serde(default)]
    weights: HashMap<String, f64>,
}

/// Mapping from signal name to non-negative weight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightTable {
    weights: HashMap<String, f64>,
    /// Weight applied to signal names not present in the map
    default_weight: f64,
}

impl Default for WeightTable {
    /// Built-in weights for the baseline extractor's signals
    fn default() -> Self {
        let weights = HashMap::from([
            ("automation_marker".to_string(), 0.4),
            ("templated_pr_style".to_string(), 0.6),
            ("uniform_authorship".to_string(), 0.3),
        ]);
        Self {
            weights,
            default_weight: 0.0,
        }
    }
}

impl WeightTable {
    /// Build a table from a name → weight map, rejecting negative weights
    pub fn from_map(weights: HashMap<String, f64>) -> ResidueResult<Self> {
        for (name, &weight) in &weights {
            if weight < 0.0 || weight.is_nan() {
                return Err(ResidueError::InvalidWeight {
                    name: name.clone(),
                    weight,
                });
            }
        }
        Ok(Self {
            weights,
            default_weight: 0.0,
        })
    }

    /// Set the weight used for signal names absent from the table
    pub fn with_default_weight(mut self, default_weight: f64) -> ResidueResult<Self> {
        if default_weight < 0.0 || default_weight.is_nan() {
            return Err(ResidueError::InvalidWeight {
                name: "<default>".to_string(),
                weight: default_weight,
            });
        }
        self.default_weight = default_weight;
        Ok(self)
    }

    /// Load a table from a JSON weights file
    pub fn load(path: &Path) -> ResidueResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: WeightsFile = serde_json::from_str(&content)
            .map_err(|e| ResidueError::WeightParse(format!("{}: {e}", path.display())))?;
        Self::from_map(file.weights)
    }

    /// Load from a path if given, otherwise use the built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> ResidueResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Weight for a signal name, falling back to the table default
    pub fn get(&self, name: &str) -> f64 {
        self.weights.get(name).copied().unwrap_or(self.default_weight)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Iterate configured (name, weight) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_table_covers_baseline_signals() {
        let table = WeightTable::default();
        assert!(table.get("automation_marker") > 0.0);
        assert!(table.get("templated_pr_style") > 0.0);
        assert_eq!(table.get("never_heard_of_it"), 0.0);
    }

    #[test]
    fn test_from_map_rejects_negative_weight() {
        let map = HashMap::from([("bad".to_string(), -0.1)]);
        assert!(matches!(
            WeightTable::from_map(map),
            Err(ResidueError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_default_weight_is_per_table() {
        let a = WeightTable::from_map(HashMap::new()).unwrap();
        let b = WeightTable::from_map(HashMap::new())
            .unwrap()
            .with_default_weight(0.5)
            .unwrap();
        assert_eq!(a.get("x"), 0.0);
        assert_eq!(b.get("x"), 0.5);
        // a is unaffected by b's default
        assert_eq!(a.get("x"), 0.0);
    }

    #[test]
    fn test_load_weights_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"weights": {{"automation_marker": 0.9}}}}"#).unwrap();
        let table = WeightTable::load(file.path()).unwrap();
        assert_eq!(table.get("automation_marker"), 0.9);
        assert_eq!(table.get("templated_pr_style"), 0.0);
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            WeightTable::load(file.path()),
            Err(ResidueError::WeightParse(_))
        ));
    }

    #[test]
    fn test_load_rejects_negative_weight_in_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"weights": {{"bad": -1.0}}}}"#).unwrap();
        assert!(WeightTable::load(file.path()).is_err());
    }
}
