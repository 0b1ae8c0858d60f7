//! Language-model-backed pipeline stages.
//!
//! Each stage owns its prompt and output parsing and talks to the model only
//! through [`LlmClient`](preprint_alert_llm::LlmClient).

pub mod analyze;
pub mod classify;
pub mod synthesize;

pub use analyze::PaperAnalyzer;
pub use classify::InterestClassifier;
pub use synthesize::ReportSynthesizer;

/// Truncate `s` to at most `max_chars` characters, appending `...` when
/// anything was cut.
pub(crate) fn truncate_content(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
