//! Parsing of dated Markdown reports.

use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use pulldown_cmark::{Options, Parser, html};
use regex::Regex;
use serde::Serialize;

use preprint_alert_shared::{PreprintAlertError, Result};

/// Excerpt length (chars) shown on the index page.
pub const EXCERPT_MAX_CHARS: usize = 200;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").expect("date regex"));

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#+[ \t]+(.+?)[ \t]*$").expect("heading regex"));

static BOLD_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\*\*(.+?)\*\*[ \t]*$").expect("bold line regex"));

/// Openers models sometimes put before the article itself.
const PREAMBLES: [&str; 2] = ["here's my", "here is my"];

/// One report, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPage {
    /// File stem, e.g. `report-2026-01-15`. Also the page's file name.
    pub slug: String,
    /// `YYYY-MM-DD` from the file name, or `Unknown`.
    pub date_str: String,
    /// Long form such as `January 15, 2026`.
    pub date_display: String,
    pub title: String,
    pub excerpt: String,
    /// Rendered body HTML.
    pub html: String,
    /// Number of arXiv abstract links in the report.
    pub paper_count: usize,
    /// Whether this is a "no interesting papers" report.
    pub is_empty: bool,
}

/// Read and parse a report file.
pub fn parse_report(path: &Path) -> Result<ReportPage> {
    let text = std::fs::read_to_string(path).map_err(|e| PreprintAlertError::io(path, e))?;

    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            PreprintAlertError::validation(format!("bad report file name: {}", path.display()))
        })?
        .to_string();

    let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();
    Ok(parse_report_text(slug, file_name, &text))
}

/// Parse report Markdown. `file_name` supplies the date.
pub fn parse_report_text(slug: String, file_name: &str, text: &str) -> ReportPage {
    let date_str = DATE_RE
        .captures(file_name)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let date_display = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map(|d| d.format("%B %d, %Y").to_string())
        .unwrap_or_else(|_| date_str.clone());

    let title = HEADING_RE
        .captures(text)
        .or_else(|| BOLD_LINE_RE.captures(text))
        .map(|c| c[1].trim().to_string())
        .unwrap_or_else(|| format!("Report {date_str}"));

    let is_empty = title.to_lowercase().contains("no interesting papers");

    ReportPage {
        slug,
        date_str,
        date_display,
        excerpt: excerpt(text),
        html: render_markdown(text),
        paper_count: text.matches("arxiv.org/abs/").count(),
        is_empty,
        title,
    }
}

fn excerpt(text: &str) -> String {
    let Some(line) = text.lines().map(str::trim).find(|line| {
        let lower = line.to_lowercase();
        !line.is_empty()
            && !line.starts_with('#')
            && !line.starts_with("**")
            && !PREAMBLES.iter().any(|p| lower.starts_with(p))
    }) else {
        return String::new();
    };

    match line.char_indices().nth(EXCERPT_MAX_CHARS) {
        Some((idx, _)) => format!("{}...", &line[..idx]),
        None => line.to_string(),
    }
}

/// Render report Markdown to HTML.
pub fn render_markdown(text: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_SMART_PUNCTUATION;

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(text, options));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ReportPage {
        parse_report_text("report-2026-01-15".into(), "report-2026-01-15.md", text)
    }

    #[test]
    fn heading_title_and_date() {
        let page = parse("# Great Title\n\nSome content here about papers.");
        assert_eq!(page.title, "Great Title");
        assert_eq!(page.date_str, "2026-01-15");
        assert_eq!(page.date_display, "January 15, 2026");
    }

    #[test]
    fn heading_found_after_preamble() {
        let page = parse("Here's my engaging article:\n\n# Actual Title\n\nContent.");
        assert_eq!(page.title, "Actual Title");
    }

    #[test]
    fn bold_line_title_fallback() {
        let page = parse("Some preamble.\n\n**Bold Title**\n\nContent here.");
        assert_eq!(page.title, "Bold Title");
    }

    #[test]
    fn date_title_fallback() {
        let page = parse("No heading here, just content about papers.");
        assert_eq!(page.title, "Report 2026-01-15");
    }

    #[test]
    fn excerpt_skips_preamble() {
        let page = parse("Here's my engaging article:\n\n# Title\n\nActual content about NLP papers.");
        assert!(!page.excerpt.contains("Here's my"));
        assert!(page.excerpt.contains("Actual content"));
    }

    #[test]
    fn long_excerpt_is_truncated() {
        let page = parse(&format!("# Title\n\n{}", "x".repeat(300)));
        assert_eq!(page.excerpt.chars().count(), EXCERPT_MAX_CHARS + 3);
        assert!(page.excerpt.ends_with("..."));
    }

    #[test]
    fn counts_paper_links_and_detects_empty_reports() {
        let page = parse(
            "# Reasoning Day\n\nSee [A](https://arxiv.org/abs/2401.00001) and \
             [B](https://arxiv.org/abs/2401.00002).",
        );
        assert_eq!(page.paper_count, 2);
        assert!(!page.is_empty);

        let empty = parse("# No interesting papers found today\n\nCheck back tomorrow!\n");
        assert!(empty.is_empty);
        assert_eq!(empty.paper_count, 0);
    }

    #[test]
    fn unknown_date_is_kept_raw() {
        let page = parse_report_text("report-draft".into(), "report-draft.md", "# T\n");
        assert_eq!(page.date_str, "Unknown");
        assert_eq!(page.date_display, "Unknown");
    }

    #[test]
    fn renders_tables_and_smart_quotes() {
        let html = render_markdown("\"quoted\"\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains('\u{201c}'));
    }
}
