//! Baseline residue extractor backed by libgit2
//!
//! Walks recent commit history and emits three normalized signals:
//!
//! - `automation_marker`: share of commits carrying agent/bot trailers
//!   ("Generated with", "Co-Authored-By" bot identities, `[bot]` authors)
//! - `templated_pr_style`: share of commit subjects following a rigid
//!   `type(scope): message` template
//! - `uniform_authorship`: concentration of commits on a single author
//!
//! These are intentionally small heuristics; their quality is not what the
//! scoring pipeline's correctness depends on.

use super::SignalExtractor;
use crate::models::{Signal, SignalSet, Subject};
use anyhow::{Context, Result};
use git2::{Repository, Sort};
use std::collections::HashMap;
use tracing::debug;

/// Message fragments that indicate an automated author or trailer
const AUTOMATION_MARKERS: &[&str] = &[
    "generated with",
    "generated by",
    "co-authored-by: claude",
    "co-authored-by: copilot",
    "co-authored-by: cursor",
    "co-authored-by: devin",
    "[bot]",
    "🤖",
];

/// Conventional-commit types that make a subject look templated
const TEMPLATE_TYPES: &[&str] = &[
    "feat", "fix", "docs", "chore", "refactor", "test", "style", "perf", "ci", "build",
];

/// Extracts residue signals from a repository's commit history
#[derive(Debug, Default)]
pub struct GitResidueExtractor;

impl GitResidueExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Default)]
struct HistorySample {
    commits: usize,
    marked: usize,
    templated: usize,
    by_author: HashMap<String, usize>,
}

impl SignalExtractor for GitResidueExtractor {
    fn name(&self) -> &str {
        "git-residue"
    }

    fn extract(&self, subject: &Subject) -> Result<SignalSet> {
        let repo = Repository::discover(&subject.repo_path).with_context(|| {
            format!(
                "Failed to open git repository at {}",
                subject.repo_path.display()
            )
        })?;
        let sample = sample_history(&repo, subject.max_commits)?;
        debug!(
            commits = sample.commits,
            marked = sample.marked,
            templated = sample.templated,
            "sampled commit history"
        );
        signals_from_sample(&sample)
    }
}

fn sample_history(repo: &Repository, max_commits: usize) -> Result<HistorySample> {
    let mut revwalk = repo.revwalk().context("Failed to walk commit history")?;
    revwalk.set_sorting(Sort::TIME)?;
    revwalk
        .push_head()
        .context("Repository has no HEAD to walk (empty repository?)")?;

    let mut sample = HistorySample::default();
    for oid_result in revwalk {
        if sample.commits >= max_commits {
            break;
        }
        let oid = oid_result?;
        let commit = repo.find_commit(oid)?;
        sample.commits += 1;

        let message = commit.message().unwrap_or("").to_lowercase();
        let author = commit.author();
        let author_key = author
            .email()
            .or_else(|| author.name())
            .unwrap_or("<unknown>")
            .to_string();

        if has_automation_marker(&message) || author_key.contains("[bot]") {
            sample.marked += 1;
        }
        if is_templated_subject(message.lines().next().unwrap_or("")) {
            sample.templated += 1;
        }
        *sample.by_author.entry(author_key).or_insert(0) += 1;
    }
    Ok(sample)
}

fn has_automation_marker(message: &str) -> bool {
    AUTOMATION_MARKERS.iter().any(|m| message.contains(m))
}

/// Does a (lowercased) commit subject follow `type(scope)!: message`?
fn is_templated_subject(subject: &str) -> bool {
    let Some((prefix, rest)) = subject.split_once(':') else {
        return false;
    };
    if rest.trim().is_empty() {
        return false;
    }
    // Strip optional `(scope)` and `!` from the type
    let prefix = prefix.trim_end_matches('!');
    let type_part = match prefix.split_once('(') {
        Some((t, scope)) if scope.ends_with(')') => t,
        Some(_) => return false,
        None => prefix,
    };
    TEMPLATE_TYPES.contains(&type_part)
}

fn signals_from_sample(sample: &HistorySample) -> Result<SignalSet> {
    if sample.commits == 0 {
        return Ok(SignalSet::new());
    }
    let commits = sample.commits as f64;

    let marker_score = sample.marked as f64 / commits;
    let templated_score = sample.templated as f64 / commits;
    let top_author = sample.by_author.values().copied().max().unwrap_or(0);
    let authorship_score = top_author as f64 / commits;

    Ok([
        Signal::new(
            "automation_marker",
            marker_score,
            format!(
                "{}/{} recent commits carry automation trailers",
                sample.marked, sample.commits
            ),
        )?,
        Signal::new(
            "templated_pr_style",
            templated_score,
            format!(
                "{}/{} recent commit subjects follow a rigid type(scope): template",
                sample.templated, sample.commits
            ),
        )?,
        Signal::new(
            "uniform_authorship",
            authorship_score,
            format!(
                "top author wrote {}/{} recent commits",
                top_author, sample.commits
            ),
        )?,
    ]
    .into_iter()
    .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use tempfile::TempDir;

    fn commit(repo: &Repository, message: &str, author: &str) {
        let sig = Signature::now(author, &format!("{author}@example.com")).unwrap();
        let tree_id = {
            let mut index = repo.index().unwrap();
            index.write_tree().unwrap()
        };
        let tree = repo.find_tree(tree_id).unwrap();
        let parent = repo
            .head()
            .ok()
            .and_then(|h| h.target())
            .map(|oid| repo.find_commit(oid).unwrap());
        let parents: Vec<_> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    fn test_repo() -> (TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_marker_detection() {
        assert!(has_automation_marker(
            "fix: thing\n\ngenerated with some agent"
        ));
        assert!(has_automation_marker("co-authored-by: claude <x@y>"));
        assert!(!has_automation_marker("fix typo in readme"));
    }

    #[test]
    fn test_templated_subject() {
        assert!(is_templated_subject("feat: add scoring"));
        assert!(is_templated_subject("fix(eval): handle empty set"));
        assert!(is_templated_subject("refactor!: rework weights"));
        assert!(!is_templated_subject("add scoring"));
        assert!(!is_templated_subject("feat:"));
        assert!(!is_templated_subject("wip(stuff: broken"));
    }

    #[test]
    fn test_extract_from_real_repo() {
        let (dir, repo) = test_repo();
        commit(&repo, "feat: initial import", "alice");
        commit(
            &repo,
            "fix: adjust weights\n\nGenerated with an agent",
            "alice",
        );
        commit(&repo, "hand-written tweak to docs", "bob");

        let extractor = GitResidueExtractor::new();
        let subject = Subject::new(dir.path());
        let signals = extractor.extract(&subject).unwrap();

        assert_eq!(signals.len(), 3);
        for signal in signals.signals() {
            assert!((0.0..=1.0).contains(&signal.score), "{signal:?}");
            assert!(!signal.evidence.is_empty());
        }
        let marker = &signals.signals()[0];
        assert_eq!(marker.name, "automation_marker");
        assert!((marker.score - 1.0 / 3.0).abs() < 1e-9);
        let templated = &signals.signals()[1];
        assert!((templated.score - 2.0 / 3.0).abs() < 1e-9);
        let authorship = &signals.signals()[2];
        assert!((authorship.score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_extract_respects_max_commits() {
        let (dir, repo) = test_repo();
        for i in 0..5 {
            commit(&repo, &format!("feat: change {i}"), "alice");
        }
        let extractor = GitResidueExtractor::new();
        let subject = Subject::new(dir.path()).with_max_commits(2);
        let signals = extractor.extract(&subject).unwrap();
        let templated = &signals.signals()[1];
        assert!(templated.evidence.contains("2/2"));
    }

    #[test]
    fn test_extract_fails_on_non_repo() {
        let dir = tempfile::tempdir().unwrap();
        // no .git anywhere under the temp root
        let extractor = GitResidueExtractor::new();
        let subject = Subject::new(dir.path().join("nothing"));
        assert!(extractor.extract(&subject).is_err());
    }
}
