//! HTTP model judge — sync calls via ureq, no async runtime needed
//!
//! Talks to any OpenAI-compatible chat-completions endpoint (OpenAI,
//! OpenRouter, a local Ollama, ...). The model is asked to answer with a
//! strict JSON object `{"score": 0.0-1.0, "rationale": "..."}`; the score
//! is clamped into [0, 1] before it enters the blend.

use super::{ModelAnalysis, ModelError, ModelJudge, ModelResult};
use crate::models::Subject;
use git2::{Repository, Sort};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MAX_PROMPT_COMMITS: usize = 20;
const MAX_RATIONALE_CHARS: usize = 220;

/// Where the judge sends its requests
#[derive(Debug, Clone)]
pub struct ModelBackend {
    /// Chat-completions URL, e.g. `https://api.openai.com/v1/chat/completions`
    pub endpoint: String,
    /// Model identifier passed in the request body
    pub model: String,
    /// Bearer token, if the endpoint requires one
    pub api_key: Option<String>,
}

impl ModelBackend {
    /// Local Ollama backend (no key required)
    pub fn ollama(model: impl Into<String>) -> Self {
        Self {
            endpoint: "http://localhost:11434/v1/chat/completions".to_string(),
            model: model.into(),
            api_key: None,
        }
    }

    /// Read the API key from an environment variable
    pub fn with_key_from_env(mut self, env_var: &str) -> ModelResult<Self> {
        let key = std::env::var(env_var)
            .map_err(|_| ModelError::MissingApiKey(env_var.to_string()))?;
        self.api_key = Some(key);
        Ok(self)
    }
}

/// Model judge backed by an OpenAI-compatible HTTP endpoint
#[derive(Debug)]
pub struct HttpModelJudge {
    backend: ModelBackend,
    agent: ureq::Agent,
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // status codes handled explicitly below
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

impl HttpModelJudge {
    pub fn new(backend: ModelBackend) -> Self {
        Self::with_timeout(backend, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(backend: ModelBackend, timeout: Duration) -> Self {
        Self {
            backend,
            agent: make_agent(timeout),
        }
    }

    fn build_prompt(&self, subject: &Subject) -> String {
        let commit_block = recent_commit_subjects(subject)
            .map(|subjects| {
                subjects
                    .iter()
                    .map(|s| format!("- {}", truncate(s, 180)))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        format!(
            "You are a strict classifier for whether a commit/PR history appears \
             agent-generated.\n\
             Return JSON only with keys: score (0.0-1.0 float), rationale (short string).\n\
             Higher score means more likely agent-generated residue.\n\n\
             Signals to consider: templated commit messages, repetitive automation \
             language, low-human-context prose, and machine-like change organization.\n\n\
             Subject: {} at {}\n\
             Recent commit subjects:\n{}\n",
            subject.subject_type,
            subject.repo_path.display(),
            if commit_block.is_empty() {
                "- none"
            } else {
                commit_block.as_str()
            }
        )
    }
}

impl ModelJudge for HttpModelJudge {
    fn model_id(&self) -> &str {
        &self.backend.model
    }

    fn judge(&self, subject: &Subject) -> ModelResult<ModelAnalysis> {
        let prompt = self.build_prompt(subject);
        debug!(model = %self.backend.model, "requesting model verdict");

        let body = ChatRequest {
            model: self.backend.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            max_tokens: 200,
            temperature: 0.0,
        };

        let mut req = self
            .agent
            .post(&self.backend.endpoint)
            .header("Content-Type", "application/json");
        if let Some(key) = &self.backend.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let response = req
            .send_json(&body)
            .map_err(|e| ModelError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.into_body().read_to_string().unwrap_or_default();
            return Err(ModelError::ApiError { status, message });
        }

        let resp: ChatResponse = response
            .into_body()
            .read_json()
            .map_err(|e| ModelError::UnparsableVerdict(e.to_string()))?;
        let text = resp
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ModelError::UnparsableVerdict("no response choices".to_string()))?;

        let verdict = parse_verdict(&text)?;
        Ok(ModelAnalysis {
            score: verdict.score.clamp(0.0, 1.0),
            rationale: truncate(&verdict.rationale, MAX_RATIONALE_CHARS).to_string(),
            model_id: self.backend.model.clone(),
        })
    }
}

/// Walk recent history and collect commit subject lines for the prompt
fn recent_commit_subjects(subject: &Subject) -> Option<Vec<String>> {
    let repo = Repository::discover(&subject.repo_path).ok()?;
    let mut revwalk = repo.revwalk().ok()?;
    revwalk.set_sorting(Sort::TIME).ok()?;
    revwalk.push_head().ok()?;

    let mut subjects = Vec::new();
    let limit = subject.max_commits.min(MAX_PROMPT_COMMITS);
    for oid in revwalk.flatten().take(limit) {
        if let Ok(commit) = repo.find_commit(oid) {
            if let Some(summary) = commit.summary() {
                subjects.push(summary.to_string());
            }
        }
    }
    Some(subjects)
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[derive(Debug, Deserialize)]
struct Verdict {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    rationale: String,
}

/// Extract the first JSON object from possibly chatty model output
fn parse_verdict(text: &str) -> ModelResult<Verdict> {
    let start = text
        .find('{')
        .ok_or_else(|| ModelError::UnparsableVerdict(truncate(text, 120).to_string()))?;
    let end = text
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| ModelError::UnparsableVerdict(truncate(text, 120).to_string()))?;
    serde_json::from_str(&text[start..=end])
        .map_err(|e| ModelError::UnparsableVerdict(e.to_string()))
}

// OpenAI-compatible API types
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}
