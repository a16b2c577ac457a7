//! Residue - agent-generated code detection
//!
//! Estimates whether a commit or PR was produced by a coding agent by
//! scoring the traces agents leave in git history, with an evaluation
//! harness that gates releases on labeled-dataset precision.

pub mod cli;
pub mod error;
pub mod eval;
pub mod model;
pub mod models;
pub mod reporters;
pub mod scoring;
pub mod signals;

pub use error::{ResidueError, ResidueResult};
