//! Article extraction and methodology excerpting.
//!
//! HTML → Markdown goes through `htmd`; the methodology excerpt is found by
//! scanning for a heading-like line, so a word such as "method" appearing
//! mid-sentence never counts as a section start.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

/// Maximum excerpt length (in chars) taken from a methodology heading onward.
pub const METHODOLOGY_MAX_CHARS: usize = 15_000;

/// Excerpt length (in chars) when no methodology heading is found.
pub const FALLBACK_MAX_CHARS: usize = 20_000;

/// Tags dropped before conversion.
const SKIP_TAGS: [&str; 8] = [
    "script", "style", "nav", "header", "footer", "iframe", "noscript", "svg",
];

/// Content containers in priority order.
static CONTENT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["article", "main", "body"]
        .iter()
        .map(|s| Selector::parse(s).expect("content selector"))
        .collect()
});

/// A heading-like line naming a methodology section, optionally preceded by
/// Markdown heading marks and a section number (`3`, `3.1`, `3.`).
static METHOD_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?P<heading>(?:#{1,6}[ \t]*)?(?:\d+(?:\.\d+)*\.?[ \t]+)?(?:methodology|methods|method|our approach|approach|proposed method|model|architecture))[ \t]*:?[ \t]*$",
    )
    .expect("methodology heading regex")
});

/// Three or more consecutive newlines (with optional trailing spaces).
static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("blank line regex"));

/// Extract the main article of an HTML page as Markdown.
///
/// Returns `None` when the page has no extractable text.
pub fn extract_article(html: &str) -> Option<String> {
    let content_html = select_content_html(html);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIP_TAGS.to_vec())
        .build();

    let markdown = converter.convert(&content_html).ok()?;
    let cleaned = normalize_blank_lines(&markdown);

    if cleaned.trim().is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Take up to [`METHODOLOGY_MAX_CHARS`] chars starting at the first
/// methodology heading, or the first [`FALLBACK_MAX_CHARS`] chars of the
/// content when there is none.
pub fn methodology_excerpt(content: &str) -> String {
    match METHOD_HEADING_RE
        .captures(content)
        .and_then(|caps| caps.name("heading"))
    {
        Some(heading) => truncate_chars(&content[heading.start()..], METHODOLOGY_MAX_CHARS).to_string(),
        None => truncate_chars(content, FALLBACK_MAX_CHARS).to_string(),
    }
}

fn select_content_html(html: &str) -> String {
    let doc = Html::parse_document(html);

    for selector in CONTENT_SELECTORS.iter() {
        if let Some(el) = doc.select(selector).next() {
            return el.inner_html();
        }
    }

    html.to_string()
}

fn normalize_blank_lines(md: &str) -> String {
    let trimmed_lines: Vec<&str> = md.lines().map(str::trim_end).collect();
    let joined = trimmed_lines.join("\n");
    BLANK_RUN_RE.replace_all(&joined, "\n\n").trim().to_string()
}

/// Slice `s` to at most `max` chars without splitting a code point.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
