//! Page templates, rendered with Handlebars. Values are HTML-escaped by
//! the engine; only pre-rendered Markdown and the stylesheet use `{{{ }}}`.

use std::sync::LazyLock;

use handlebars::Handlebars;
use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

use preprint_alert_shared::{PreprintAlertError, Result};

use crate::report::ReportPage;

const SITE_NAME: &str = "Preprint Alert";
const PROJECT_URL: &str = "https://github.com/preprint-alert-agent";
const TAGLINE: &str = "AI-curated daily highlights from arXiv";

/// Characters of a neighbour's title shown in older/newer links.
const NAV_TITLE_CHARS: usize = 50;

/// Characters of the excerpt used for `og:description`.
const OG_DESCRIPTION_CHARS: usize = 200;

/// A leading `<h1>`–`<h3>`; the page header already shows the title.
static LEADING_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A\s*<h[123][^>]*>.*?</h[123]>").expect("leading heading regex")
});

const CSS: &str = r#"
*, *::before, *::after { margin: 0; padding: 0; box-sizing: border-box; }
:root {
  --text: #353740; --muted: #6e6e80; --bg: #fafaf9; --bg-alt: #f3f3f0;
  --border: #e5e5e6; --accent: #10a37f;
}
@media (prefers-color-scheme: dark) {
  :root {
    --text: #d1d5db; --muted: #9ca3af; --bg: #111; --bg-alt: #1a1a1a;
    --border: #2a2a2a; --accent: #34d399;
  }
}
body {
  font-family: -apple-system, BlinkMacSystemFont, "Helvetica Neue", sans-serif;
  color: var(--text); background: var(--bg); line-height: 1.8; font-size: 17px;
  min-height: 100vh; display: flex; flex-direction: column;
}
main { flex: 1; }
a { color: var(--accent); }
.container { max-width: 680px; margin: 0 auto; padding: 0 24px; }
.site-header { border-bottom: 1px solid var(--border); padding: 20px 0; margin-bottom: 48px; }
.site-header .container { display: flex; align-items: center; justify-content: space-between; }
.site-title { font-weight: 600; color: var(--text); text-decoration: none; }
.site-nav a, .back-link, .article-nav a { color: var(--muted); text-decoration: none; font-size: 15px; }
.site-nav a:hover, .back-link:hover, .article-nav a:hover { color: var(--accent); }
.index-tagline { color: var(--muted); padding-bottom: 32px; }
.report-list { list-style: none; }
.report-item { border-top: 1px solid var(--border); padding: 28px 0; }
.report-item:last-child { border-bottom: 1px solid var(--border); }
.report-item h2 { font-family: Georgia, serif; font-weight: 400; font-size: 26px; line-height: 1.3; }
.report-item h2 a { color: var(--text); text-decoration: none; }
.report-item h2 a:hover { color: var(--accent); }
.report-item-empty { opacity: 0.55; }
.report-item-empty h2 { font-family: inherit; font-size: 18px; }
.report-date, .article-date {
  font-size: 14px; color: var(--muted); text-transform: uppercase; letter-spacing: 0.05em;
}
.report-badge {
  font-size: 12px; color: var(--accent); background: var(--bg-alt); padding: 2px 8px;
  border-radius: 10px; margin-left: 10px; text-transform: none; letter-spacing: 0;
}
.report-excerpt { color: var(--muted); font-size: 16px; line-height: 1.6; }
.article-header { padding: 64px 0 40px; text-align: center; }
.article-header h1 { font-family: Georgia, serif; font-weight: 400; font-size: 40px; line-height: 1.2; }
.article-body { padding-bottom: 64px; }
.article-body h2, .article-body h3 { font-family: Georgia, serif; font-weight: 400; margin: 48px 0 16px; }
.article-body p, .article-body ul, .article-body ol, .article-body table { margin-bottom: 24px; }
.article-body ul, .article-body ol { padding-left: 24px; }
.article-body blockquote { border-left: 3px solid var(--border); padding-left: 20px; color: var(--muted); }
.article-body code { background: var(--bg-alt); padding: 2px 6px; border-radius: 4px; font-size: 0.9em; }
.back-link { display: inline-block; padding-top: 40px; }
.article-nav { display: flex; justify-content: space-between; gap: 24px; padding-top: 32px; }
.nav-newer { margin-left: auto; text-align: right; }
footer { border-top: 1px solid var(--border); padding: 32px 0; margin-top: 48px; text-align: center; font-size: 14px; color: var(--muted); }
footer a { color: var(--muted); }
"#;

const SHELL: &str = "shell";
const REPORT: &str = "report";
const INDEX: &str = "index";

const SHELL_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{title}}</title>
{{#if description}}
    <meta property="og:title" content="{{title}}">
    <meta property="og:description" content="{{description}}">
    <meta property="og:type" content="article">
{{/if}}
    <style>{{{css}}}</style>
</head>
<body>
    <header class="site-header">
        <div class="container">
            <a href="index.html" class="site-title">{{site_name}}</a>
            <nav class="site-nav"><a href="{{project_url}}">GitHub</a></nav>
        </div>
    </header>
{{{content}}}
    <footer>
        <div class="container">Built with <a href="{{project_url}}">{{site_name}}</a></div>
    </footer>
</body>
</html>
"#;

const REPORT_TEMPLATE: &str = r#"    <main class="container">
        <div class="article-header">
            <div class="article-date">{{report.date_display}}</div>
            <h1>{{report.title}}</h1>
        </div>
        <div class="article-body">
            {{{body}}}
        </div>
        <a href="index.html" class="back-link">&larr; All reports</a>
        <div class="article-nav">
{{#if older}}
            <a class="nav-older" href="{{older.slug}}.html">&larr; {{older.title}}</a>
{{/if}}
{{#if newer}}
            <a class="nav-newer" href="{{newer.slug}}.html">{{newer.title}} &rarr;</a>
{{/if}}
        </div>
    </main>"#;

const INDEX_TEMPLATE: &str = r#"    <main class="container">
        <p class="index-tagline">{{tagline}}</p>
        <ul class="report-list">
{{#each reports}}
{{#if is_empty}}
        <li class="report-item report-item-empty">
            <div class="report-date">{{date_display}}</div>
            <h2>No interesting papers today</h2>
        </li>
{{else}}
        <li class="report-item">
            <div class="report-date">{{date_display}}{{#if badge}}<span class="report-badge">{{badge}}</span>{{/if}}</div>
            <h2><a href="{{slug}}.html">{{title}}</a></h2>
            <p class="report-excerpt">{{excerpt}}</p>
        </li>
{{/if}}
{{/each}}
        </ul>
    </main>"#;

/// Index row: the report plus its paper-count badge.
#[derive(Serialize)]
struct IndexEntry<'a> {
    #[serde(flatten)]
    report: &'a ReportPage,
    badge: Option<String>,
}

fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn nav_link(report: &ReportPage) -> Value {
    json!({
        "slug": report.slug,
        "title": clip(&report.title, NAV_TITLE_CHARS),
    })
}

fn badge(paper_count: usize) -> Option<String> {
    match paper_count {
        0 => None,
        1 => Some("1 paper".to_string()),
        n => Some(format!("{n} papers")),
    }
}

/// The registered page templates.
pub struct Templates {
    handlebars: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        for (name, source) in [
            (SHELL, SHELL_TEMPLATE),
            (REPORT, REPORT_TEMPLATE),
            (INDEX, INDEX_TEMPLATE),
        ] {
            handlebars
                .register_template_string(name, source)
                .map_err(|e| PreprintAlertError::template(format!("{name}: {e}")))?;
        }
        Ok(Self { handlebars })
    }

    fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        self.handlebars
            .render(name, data)
            .map_err(|e| PreprintAlertError::template(format!("{name}: {e}")))
    }

    fn page_shell(&self, title: &str, content: &str, description: Option<&str>) -> Result<String> {
        let description = description
            .filter(|d| !d.is_empty())
            .map(|d| clip(d, OG_DESCRIPTION_CHARS));
        self.render(
            SHELL,
            &json!({
                "title": title,
                "description": description,
                "css": CSS,
                "site_name": SITE_NAME,
                "project_url": PROJECT_URL,
                "content": content,
            }),
        )
    }

    /// Render one report page. `older` and `newer` are its neighbours in the
    /// date-ordered list.
    pub fn report_page(
        &self,
        report: &ReportPage,
        older: Option<&ReportPage>,
        newer: Option<&ReportPage>,
    ) -> Result<String> {
        let body = LEADING_HEADING_RE.replace(&report.html, "");
        let article = self.render(
            REPORT,
            &json!({
                "report": report,
                "body": body.trim(),
                "older": older.map(nav_link),
                "newer": newer.map(nav_link),
            }),
        )?;
        self.page_shell(&report.title, &article, Some(&report.excerpt))
    }

    /// Render the index listing, newest first.
    pub fn index_page(&self, reports: &[ReportPage]) -> Result<String> {
        let entries: Vec<IndexEntry<'_>> = reports
            .iter()
            .map(|report| IndexEntry {
                report,
                badge: badge(report.paper_count),
            })
            .collect();
        let body = self.render(INDEX, &json!({ "tagline": TAGLINE, "reports": entries }))?;
        self.page_shell(SITE_NAME, &body, None)
    }
}
