//! Core domain types for Preprint Alert runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PaperId
// ---------------------------------------------------------------------------

/// Stable paper identifier derived from the feed's canonical link
/// (for arXiv, the path after `/abs/`, e.g. `2401.12345` or `cs/0123456`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperId(String);

impl PaperId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive an identifier from a canonical link such as
    /// `https://arxiv.org/abs/2401.12345/`. Old-style ids keep their archive
    /// prefix; links without `/abs/` fall back to the last path segment.
    pub fn from_link(link: &str) -> Self {
        let trimmed = link.trim().trim_end_matches('/');
        let id = match trimmed.split_once("/abs/") {
            Some((_, rest)) if !rest.is_empty() => rest,
            _ => trimmed.rsplit('/').next().unwrap_or(trimmed),
        };
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaperId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaperId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Paper
// ---------------------------------------------------------------------------

/// A candidate paper from the feed. Immutable for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Stable identifier.
    pub id: PaperId,
    /// Title with whitespace collapsed.
    pub title: String,
    /// Authors in feed order.
    pub authors: Vec<String>,
    /// Abstract text.
    pub abstract_text: String,
    /// Canonical publication link (abs page).
    pub link: String,
    /// Feed timestamp, when the feed carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
}

impl Paper {
    /// URL of the paper's HTML rendering under `html_base`
    /// (e.g. `https://arxiv.org/html`).
    pub fn html_url(&self, html_base: &str) -> String {
        format!("{}/{}", html_base.trim_end_matches('/'), self.id)
    }
}

// ---------------------------------------------------------------------------
// ExtendedContent
// ---------------------------------------------------------------------------

/// Full-text content retrieved for one paper by a content fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedContent {
    /// Where the content came from.
    pub source_url: String,
    /// Extracted article text (Markdown).
    pub text: String,
    /// Bounded methodology excerpt taken from `text`.
    pub methodology: String,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Outcome tag for a per-paper analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Content fetched and analysis produced.
    Ok,
    /// Content fetch failed; analysis (if any) is based on the abstract only.
    FetchFailed,
    /// The analysis step itself failed.
    AnalysisFailed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::FetchFailed => "fetch_failed",
            Self::AnalysisFailed => "analysis_failed",
        }
    }
}

/// Structured per-paper analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Short summary of the paper.
    pub summary: String,
    /// Why the paper matches the interest profile.
    pub relevance: String,
    /// Notable findings, most important first.
    #[serde(default)]
    pub findings: Vec<String>,
    /// Methodology excerpt the analysis was based on. `None` when the content
    /// fetch failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methodology: Option<String>,
    pub status: AnalysisStatus,
    /// Item error message for failed fetches or analyses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Analysis {
    /// A failed analysis: summary and rationale left empty.
    pub fn failed(methodology: Option<String>, error: impl Into<String>) -> Self {
        Self {
            summary: String::new(),
            relevance: String::new(),
            findings: Vec::new(),
            methodology,
            status: AnalysisStatus::AnalysisFailed,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paper_id_from_link() {
        assert_eq!(
            PaperId::from_link("https://arxiv.org/abs/2401.12345").as_str(),
            "2401.12345"
        );
        assert_eq!(
            PaperId::from_link("https://arxiv.org/abs/2401.12345/").as_str(),
            "2401.12345"
        );
        assert_eq!(
            PaperId::from_link("https://example.org/papers/42").as_str(),
            "42"
        );
    }

    #[test]
    fn old_style_ids_keep_their_archive() {
        let cs = PaperId::from_link("http://arxiv.org/abs/cs/0123456");
        let math = PaperId::from_link("http://arxiv.org/abs/math/0123456/");
        assert_eq!(cs.as_str(), "cs/0123456");
        assert_eq!(math.as_str(), "math/0123456");
        assert_ne!(cs, math);
    }

    #[test]
    fn html_url_joins_base_and_id() {
        let paper = Paper {
            id: PaperId::new("2401.12345"),
            title: "T".into(),
            authors: vec![],
            abstract_text: String::new(),
            link: "https://arxiv.org/abs/2401.12345".into(),
            published: None,
        };
        assert_eq!(
            paper.html_url("https://arxiv.org/html/"),
            "https://arxiv.org/html/2401.12345"
        );
    }

    #[test]
    fn analysis_status_serializes_snake_case() {
        let json = serde_json::to_string(&AnalysisStatus::FetchFailed).expect("serialize");
        assert_eq!(json, r#""fetch_failed""#);
        assert_eq!(AnalysisStatus::AnalysisFailed.as_str(), "analysis_failed");
    }

    #[test]
    fn failed_analysis_has_empty_text() {
        let a = Analysis::failed(None, "model timeout");
        assert!(a.summary.is_empty());
        assert!(a.relevance.is_empty());
        assert_eq!(a.status, AnalysisStatus::AnalysisFailed);
    }
}
