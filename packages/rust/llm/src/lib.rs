//! Language-model client capability.
//!
//! The pipeline stages talk to a model only through [`LlmClient::complete`].
//! Provider-specific request formatting and response parsing stay behind that
//! one method; [`OpenRouterClient`] is the OpenAI-compatible implementation.

mod openrouter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use openrouter::{OpenRouterClient, OpenRouterOptions};
pub use preprint_alert_shared::ModelError;

/// Which pipeline stage a completion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    ClassifyPapers,
    AnalyzePaper,
    SynthesizeReport,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassifyPapers => "classify_papers",
            Self::AnalyzePaper => "analyze_paper",
            Self::SynthesizeReport => "synthesize_report",
        }
    }
}

/// A single completion request: system prompt, user message, and an optional
/// JSON schema the answer should follow.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub task: TaskKind,
    pub system: String,
    pub user: String,
    /// JSON schema for structured output. Providers that cannot enforce it
    /// may ignore it; callers still validate the answer.
    pub schema: Option<serde_json::Value>,
}

impl CompletionRequest {
    pub fn new(task: TaskKind, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            task,
            system: system.into(),
            user: user.into(),
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// A language-model provider.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one completion and return the answer text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError>;
}

/// Strip a surrounding Markdown code fence (```` ```json ... ``` ````) if the
/// model wrapped its JSON answer in one.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
