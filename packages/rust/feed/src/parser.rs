//! arXiv RSS item → [`Paper`] conversion.
//!
//! The arXiv listing feeds are RSS 2.0 with Dublin Core creators:
//! - `<title>`: paper title (older feeds prefix it with `<id>:`)
//! - `<link>`: canonical abs page, e.g. `https://arxiv.org/abs/2401.12345`
//! - `<description>`: `arXiv:<id> Announce Type: new Abstract: <text>`
//! - `<dc:creator>`: comma-separated author list

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use preprint_alert_shared::{Paper, PaperId, PreprintAlertError, Result};

/// Matches the announcement preamble arXiv puts in front of each abstract.
static ANNOUNCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*arXiv:\S+\s+Announce\s+Type:\s*\S+\s+Abstract:\s*")
        .expect("announce regex")
});

/// Parse an RSS/Atom document into papers, in feed order.
///
/// Items without a title or link are skipped.
pub(crate) fn parse_feed(content: &str) -> Result<Vec<Paper>> {
    let feed = feed_rs::parser::parse(content.as_bytes())
        .map_err(|e| PreprintAlertError::parse(format!("failed to parse feed: {e}")))?;

    let mut papers = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        match entry_to_paper(entry) {
            Some(paper) => papers.push(paper),
            None => debug!("skipping feed item without title or link"),
        }
    }

    Ok(papers)
}

fn entry_to_paper(entry: feed_rs::model::Entry) -> Option<Paper> {
    let raw_title = entry.title.map(|t| t.content)?;
    let link = entry.links.first()?.href.trim().to_string();
    if link.is_empty() {
        return None;
    }

    let id = PaperId::from_link(&link);

    // Clean title - strip the "<id>:" prefix used by older feeds
    let mut title = clean_text(&raw_title);
    if let Some(rest) = title.strip_prefix(&format!("{id}:")) {
        title = rest.trim().to_string();
    }
    if title.is_empty() {
        return None;
    }

    let description = entry.summary.map(|s| s.content).unwrap_or_default();
    let abstract_text = clean_text(&ANNOUNCE_RE.replace(&description, ""));

    let authors = entry
        .authors
        .iter()
        .flat_map(|person| person.name.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect();

    Some(Paper {
        id,
        title,
        authors,
        abstract_text,
        link,
        published: entry.published.or(entry.updated),
    })
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
