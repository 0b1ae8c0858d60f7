//! Interest classification: pick the papers worth a closer look.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, instrument};

use preprint_alert_llm::{CompletionRequest, LlmClient, TaskKind, strip_code_fence};
use preprint_alert_shared::{ClassificationError, Paper, PaperId};

use super::truncate_content;

/// Abstract length (chars) shown to the classifier per paper.
pub const ABSTRACT_MAX_CHARS: usize = 500;

const SYSTEM_PROMPT: &str = "You are a research paper curator. Your job is to review paper \
titles and abstracts from arXiv and identify which ones are genuinely interesting and worth \
reading in detail.

{interests}

Be selective: only pick papers that seem to have novel ideas or methods. \
Answer with a JSON object of the form {\"selected_ids\": [\"<arXiv ID>\", ...]} using the IDs \
exactly as given. Return an empty list when nothing qualifies.";

/// Selects papers that match the interest profile.
pub struct InterestClassifier {
    llm: Arc<dyn LlmClient>,
    interests: String,
}

impl InterestClassifier {
    pub fn new(llm: Arc<dyn LlmClient>, interests: impl Into<String>) -> Self {
        Self {
            llm,
            interests: interests.into(),
        }
    }

    /// Ask the model which papers are interesting.
    ///
    /// The returned ids are de-duplicated and in the model's order. They are
    /// not checked against `papers`; the caller clamps them.
    #[instrument(skip_all, fields(papers = papers.len()))]
    pub async fn classify(&self, papers: &[Paper]) -> Result<Vec<PaperId>, ClassificationError> {
        let request = self.build_request(papers);
        let output = self.llm.complete(&request).await?;
        let ids = parse_selection(&output)?;
        debug!(selected = ids.len(), "classifier answered");
        Ok(ids)
    }

    pub fn build_request(&self, papers: &[Paper]) -> CompletionRequest {
        let listing = papers
            .iter()
            .map(|p| {
                format!(
                    "ID: {}\nTitle: {}\nAbstract: {}",
                    p.id,
                    p.title,
                    truncate_content(&p.abstract_text, ABSTRACT_MAX_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        CompletionRequest::new(
            TaskKind::ClassifyPapers,
            SYSTEM_PROMPT.replace("{interests}", self.interests.trim()),
            format!("Here are today's papers:\n\n{listing}"),
        )
        .with_schema(selection_schema())
    }
}

fn selection_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "selected_ids": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["selected_ids"],
        "additionalProperties": false
    })
}

/// Parse the classifier's answer into paper ids.
///
/// Accepts `{"selected_ids": [...]}`, a bare JSON array, or plain text with
/// one id per line. Blank output means nothing was selected. JSON of any
/// other shape is rejected.
pub fn parse_selection(output: &str) -> Result<Vec<PaperId>, ClassificationError> {
    let body = strip_code_fence(output);
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let raw: Vec<String> = if body.starts_with('{') || body.starts_with('[') {
        parse_json_selection(body)?
    } else {
        body.lines().filter_map(id_from_line).collect()
    };

    let mut seen = HashSet::new();
    Ok(raw
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .map(PaperId::new)
        .collect())
}

fn parse_json_selection(body: &str) -> Result<Vec<String>, ClassificationError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ClassificationError::Unparseable(format!("invalid JSON: {e}")))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("selected_ids") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ClassificationError::Unparseable(
                    "expected a \"selected_ids\" array".into(),
                ));
            }
        },
        other => {
            return Err(ClassificationError::Unparseable(format!(
                "unexpected JSON value: {other}"
            )));
        }
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.trim().to_string()),
            other => Err(ClassificationError::Unparseable(format!(
                "expected string ids, found {other}"
            ))),
        })
        .filter(|r| !matches!(r, Ok(s) if s.is_empty()))
        .collect()
}

/// First token of a plain-text answer line, with list markers and an
/// `arXiv:` prefix removed. Comment (`#`) and blank lines yield nothing.
fn id_from_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let line = line
        .trim_start_matches(['-', '*', '•'])
        .trim_start();
    let line = match line.split_once(['.', ')']) {
        Some((num, rest))
            if !num.is_empty()
                && num.chars().all(|c| c.is_ascii_digit())
                && rest.starts_with(' ') =>
        {
            rest.trim_start()
        }
        _ => line,
    };

    let token = line.split_whitespace().next()?;
    let token = token.trim_matches(|c: char| matches!(c, '`' | '"' | '\'' | ',' | ';'));
    let token = token
        .strip_prefix("arXiv:")
        .or_else(|| token.strip_prefix("arxiv:"))
        .unwrap_or(token);

    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<PaperId> {
        v.iter().map(|s| PaperId::new(*s)).collect()
    }

    #[test]
    fn parses_selected_ids_object() {
        let out = r#"{"selected_ids": ["2401.00001", "2401.00003"]}"#;
        assert_eq!(parse_selection(out).unwrap(), ids(&["2401.00001", "2401.00003"]));
    }

    #[test]
    fn parses_fenced_bare_array() {
        let out = "```json\n[\"2401.00002\"]\n```";
        assert_eq!(parse_selection(out).unwrap(), ids(&["2401.00002"]));
    }

    #[test]
    fn parses_plain_lines_skipping_comments_and_markers() {
        let out = "# Interesting papers\n2401.00001\n- 2401.00002\n2. arXiv:2401.00003 (reasoning)\n\n";
        assert_eq!(
            parse_selection(out).unwrap(),
            ids(&["2401.00001", "2401.00002", "2401.00003"])
        );
    }

    #[test]
    fn duplicates_collapse_to_first_occurrence() {
        let out = r#"["b", "a", "b"]"#;
        assert_eq!(parse_selection(out).unwrap(), ids(&["b", "a"]));
    }

    #[test]
    fn blank_output_selects_nothing() {
        assert!(parse_selection("  \n ").unwrap().is_empty());
        assert!(parse_selection(r#"{"selected_ids": []}"#).unwrap().is_empty());
    }

    #[test]
    fn wrong_json_shape_is_unparseable() {
        let err = parse_selection(r#"{"papers": ["2401.00001"]}"#).unwrap_err();
        assert!(matches!(err, ClassificationError::Unparseable(_)));

        let err = parse_selection("[1, 2]").unwrap_err();
        assert!(matches!(err, ClassificationError::Unparseable(_)));

        let err = parse_selection("{not json").unwrap_err();
        assert!(matches!(err, ClassificationError::Unparseable(_)));
    }

    #[test]
    fn request_lists_papers_with_truncated_abstracts() {
        struct Unused;
        #[async_trait::async_trait]
        impl LlmClient for Unused {
            async fn complete(
                &self,
                _request: &CompletionRequest,
            ) -> Result<String, preprint_alert_llm::ModelError> {
                unreachable!()
            }
        }

        let classifier = InterestClassifier::new(Arc::new(Unused), "I like reasoning.");
        let paper = Paper {
            id: PaperId::new("2401.00001"),
            title: "Long Thoughts".into(),
            authors: vec![],
            abstract_text: "x".repeat(800),
            link: "https://arxiv.org/abs/2401.00001".into(),
            published: None,
        };

        let request = classifier.build_request(&[paper]);
        assert_eq!(request.task, TaskKind::ClassifyPapers);
        assert!(request.system.contains("I like reasoning."));
        assert!(request.user.contains("ID: 2401.00001\nTitle: Long Thoughts"));
        assert!(request.user.contains(&format!("{}...", "x".repeat(ABSTRACT_MAX_CHARS))));
        assert!(!request.user.contains(&"x".repeat(ABSTRACT_MAX_CHARS + 1)));
        assert!(request.schema.is_some());
    }
}
