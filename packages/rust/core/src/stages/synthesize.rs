//! Report synthesis: turn the analyses into one narrative article.

use std::sync::Arc;

use tracing::{debug, instrument};

use preprint_alert_llm::{CompletionRequest, LlmClient, TaskKind};
use preprint_alert_shared::{Analysis, AnalysisStatus, Paper, SynthesisError};

/// Authors listed per paper before "et al.".
const MAX_AUTHORS: usize = 5;

const SYSTEM_PROMPT: &str = "You are a science journalist writing an engaging article about \
today's interesting papers from arXiv.

{interests}

Write a compelling, free-form article in Markdown that:
1. Opens with a hook about today's most exciting developments
2. Weaves the papers together into a narrative instead of listing them
3. Highlights the coolest methodological insights
4. Explains why these advances matter
5. Links every paper you discuss inline using [paper title](url)

Some papers could not be analyzed; they are marked as unavailable. Mention them briefly \
with their link, based on the title alone.

Write in an engaging, accessible style, like a blog post from a researcher who is excited \
about what they found. Do not use bullet points or numbered lists.";

/// Writes the final report.
pub struct ReportSynthesizer {
    llm: Arc<dyn LlmClient>,
    interests: String,
}

impl ReportSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>, interests: impl Into<String>) -> Self {
        Self {
            llm,
            interests: interests.into(),
        }
    }

    /// Synthesize a Markdown report from `(Paper, Analysis)` pairs, in the
    /// order given.
    #[instrument(skip_all, fields(items = items.len()))]
    pub async fn synthesize(&self, items: &[(&Paper, &Analysis)]) -> Result<String, SynthesisError> {
        let request = self.build_request(items);
        let output = self.llm.complete(&request).await?;

        let report = output.trim();
        if report.is_empty() {
            return Err(SynthesisError::EmptyResponse);
        }

        debug!(len = report.len(), "report synthesized");
        Ok(format!("{report}\n"))
    }

    pub fn build_request(&self, items: &[(&Paper, &Analysis)]) -> CompletionRequest {
        let body = items
            .iter()
            .map(|(paper, analysis)| describe_item(paper, analysis))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        CompletionRequest::new(
            TaskKind::SynthesizeReport,
            SYSTEM_PROMPT.replace("{interests}", self.interests.trim()),
            format!("Here are the papers I analyzed today:\n\n{body}"),
        )
    }
}

fn describe_item(paper: &Paper, analysis: &Analysis) -> String {
    let mut authors = paper
        .authors
        .iter()
        .take(MAX_AUTHORS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if paper.authors.len() > MAX_AUTHORS {
        authors.push_str(" et al.");
    }

    let mut out = format!(
        "Paper: {}\nLink: {}\nAuthors: {}\n",
        paper.title, paper.link, authors
    );

    match analysis.status {
        AnalysisStatus::AnalysisFailed => {
            out.push_str("Analysis: unavailable (the analysis of this paper failed)");
            return out;
        }
        AnalysisStatus::FetchFailed => {
            out.push_str("Note: full text unavailable, analysis based on the abstract only\n");
        }
        AnalysisStatus::Ok => {}
    }

    out.push_str(&format!("Summary: {}\n", analysis.summary));
    if !analysis.relevance.is_empty() {
        out.push_str(&format!("Why it matters: {}\n", analysis.relevance));
    }
    if !analysis.findings.is_empty() {
        out.push_str("Key findings:\n");
        for finding in &analysis.findings {
            out.push_str(&format!("- {finding}\n"));
        }
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use preprint_alert_shared::PaperId;

    fn paper(id: &str, authors: usize) -> Paper {
        Paper {
            id: PaperId::new(id),
            title: format!("Title {id}"),
            authors: (0..authors).map(|i| format!("Author {i}")).collect(),
            abstract_text: "Abstract.".into(),
            link: format!("https://arxiv.org/abs/{id}"),
            published: None,
        }
    }

    #[test]
    fn failed_item_is_marked_unavailable() {
        let p = paper("1", 2);
        let failed = Analysis::failed(None, "model timeout");
        let text = describe_item(&p, &failed);
        assert!(text.contains("Link: https://arxiv.org/abs/1"));
        assert!(text.contains("unavailable"));
        assert!(!text.contains("Summary:"));
    }

    #[test]
    fn fetch_failed_item_notes_abstract_only() {
        let p = paper("2", 7);
        let analysis = Analysis {
            summary: "Short.".into(),
            relevance: "Relevant.".into(),
            findings: vec!["First".into()],
            methodology: None,
            status: AnalysisStatus::FetchFailed,
            error: Some("no HTML".into()),
        };
        let text = describe_item(&p, &analysis);
        assert!(text.contains("abstract only"));
        assert!(text.contains("Author 4 et al."));
        assert!(!text.contains("Author 5"));
        assert!(text.contains("- First"));
    }
}
