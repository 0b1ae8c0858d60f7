//! Per-paper analysis.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use preprint_alert_llm::{CompletionRequest, LlmClient, TaskKind, strip_code_fence};
use preprint_alert_shared::{Analysis, AnalysisError, AnalysisStatus, Paper};

use super::truncate_content;

/// Methodology excerpt length (chars) included in the analysis prompt.
pub const EXCERPT_MAX_CHARS: usize = 10_000;

const SYSTEM_PROMPT: &str = "You are a research paper analyst. Your job is to read a paper's \
content and extract the key insights about its methodology and contributions.

Focus on:
1. What is the core methodological innovation?
2. What makes this approach different from prior work?
3. What are the key technical details that make this work?
4. What are the main results and why do they matter?

The reader's interests:
{interests}

Be concise but insightful. Answer with a JSON object with the fields \"summary\" (a short \
paragraph), \"relevance\" (why this paper matters given the interests above) and \"findings\" \
(a list of the most notable technical points, most important first).";

/// Produces a structured [`Analysis`] for one paper.
pub struct PaperAnalyzer {
    llm: Arc<dyn LlmClient>,
    interests: String,
}

#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    #[serde(default)]
    summary: String,
    #[serde(default, alias = "why_interesting")]
    relevance: String,
    #[serde(default)]
    findings: Vec<String>,
}

impl PaperAnalyzer {
    pub fn new(llm: Arc<dyn LlmClient>, interests: impl Into<String>) -> Self {
        Self {
            llm,
            interests: interests.into(),
        }
    }

    /// Analyze `paper`, using the methodology excerpt when one was fetched
    /// and the abstract alone otherwise.
    ///
    /// The returned analysis has status [`AnalysisStatus::Ok`]; the caller
    /// re-tags it when the content fetch failed.
    #[instrument(skip_all, fields(id = %paper.id, has_excerpt = methodology.is_some()))]
    pub async fn analyze(
        &self,
        paper: &Paper,
        methodology: Option<&str>,
    ) -> Result<Analysis, AnalysisError> {
        let request = self.build_request(paper, methodology);
        let output = self.llm.complete(&request).await?;
        let mut analysis = parse_analysis(&output)?;
        analysis.methodology = methodology.map(str::to_string);
        debug!(findings = analysis.findings.len(), "paper analyzed");
        Ok(analysis)
    }

    pub fn build_request(&self, paper: &Paper, methodology: Option<&str>) -> CompletionRequest {
        let content = match methodology {
            Some(excerpt) => format!(
                "Title: {}\n\nAbstract: {}\n\nMethodology section:\n{}",
                paper.title,
                paper.abstract_text,
                truncate_content(excerpt, EXCERPT_MAX_CHARS)
            ),
            None => format!(
                "Title: {}\n\nAbstract: {}\n\n(Full text not available for this paper)",
                paper.title, paper.abstract_text
            ),
        };

        CompletionRequest::new(
            TaskKind::AnalyzePaper,
            SYSTEM_PROMPT.replace("{interests}", self.interests.trim()),
            content,
        )
        .with_schema(analysis_schema())
    }
}

fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": { "type": "string" },
            "relevance": { "type": "string" },
            "findings": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["summary", "relevance", "findings"],
        "additionalProperties": false
    })
}

/// Parse the analyst's answer. Output that is not the expected JSON object
/// is kept whole as the summary.
pub fn parse_analysis(output: &str) -> Result<Analysis, AnalysisError> {
    let body = strip_code_fence(output);
    if body.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }

    let payload = serde_json::from_str::<AnalysisPayload>(body)
        .ok()
        .filter(|p| !p.summary.trim().is_empty())
        .unwrap_or_else(|| AnalysisPayload {
            summary: body.to_string(),
            relevance: String::new(),
            findings: Vec::new(),
        });

    Ok(Analysis {
        summary: payload.summary.trim().to_string(),
        relevance: payload.relevance.trim().to_string(),
        findings: payload
            .findings
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect(),
        methodology: None,
        status: AnalysisStatus::Ok,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_answer() {
        let out = r#"{"summary": " A verifier. ", "relevance": "Reasoning.", "findings": ["x", " "]}"#;
        let analysis = parse_analysis(out).unwrap();
        assert_eq!(analysis.summary, "A verifier.");
        assert_eq!(analysis.relevance, "Reasoning.");
        assert_eq!(analysis.findings, vec!["x".to_string()]);
        assert_eq!(analysis.status, AnalysisStatus::Ok);
    }

    #[test]
    fn prose_answer_becomes_summary() {
        let out = "The paper trains a step-level verifier.";
        let analysis = parse_analysis(out).unwrap();
        assert_eq!(analysis.summary, out);
        assert!(analysis.relevance.is_empty());
    }

    #[test]
    fn json_without_summary_falls_back_to_raw_text() {
        let out = r#"{"notes": "hm"}"#;
        assert_eq!(parse_analysis(out).unwrap().summary, out);
    }

    #[test]
    fn empty_answer_is_an_error() {
        assert!(matches!(
            parse_analysis("```\n```"),
            Err(AnalysisError::EmptyResponse)
        ));
    }
}
