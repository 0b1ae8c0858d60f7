//! Static site builder over the accumulated daily reports.
//!
//! Reads `report-*.md` files from a reports directory and writes one HTML
//! page per report plus an `index.html` listing, newest first.

mod html;
mod report;

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use preprint_alert_shared::{PreprintAlertError, Result};

pub use report::{EXCERPT_MAX_CHARS, ReportPage, parse_report, parse_report_text, render_markdown};

/// Build the site. Returns the number of report pages written; when there
/// are no reports nothing is written and `0` is returned.
#[instrument(skip_all, fields(reports = %reports_dir.display(), site = %site_dir.display()))]
pub fn build_site(reports_dir: &Path, site_dir: &Path) -> Result<usize> {
    let files = report_files(reports_dir)?;
    if files.is_empty() {
        warn!("no reports found to build site from");
        return Ok(0);
    }

    let reports = files
        .iter()
        .map(|path| parse_report(path))
        .collect::<Result<Vec<_>>>()?;

    let templates = html::Templates::new()?;
    std::fs::create_dir_all(site_dir).map_err(|e| PreprintAlertError::io(site_dir, e))?;

    for (i, report) in reports.iter().enumerate() {
        let older = reports.get(i + 1);
        let newer = i.checked_sub(1).and_then(|j| reports.get(j));
        let page = templates.report_page(report, older, newer)?;
        write_file(&site_dir.join(format!("{}.html", report.slug)), &page)?;
    }

    write_file(&site_dir.join("index.html"), &templates.index_page(&reports)?)?;

    info!(pages = reports.len(), "site built");
    Ok(reports.len())
}

/// `report-*.md` files in `dir`, newest (by file name) first. A missing
/// directory has no reports.
fn report_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| PreprintAlertError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| PreprintAlertError::io(dir, e))?.path();
        let is_report = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("report-") && n.ends_with(".md"));
        if is_report && path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    Ok(files)
}

/// Write to a temp file next to `path`, then rename over it.
fn write_file(path: &Path, content: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("page.html");
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| PreprintAlertError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| PreprintAlertError::io(path, e))?;

    debug!(path = %path.display(), size = content.len(), "wrote page");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, text: &str) {
        std::fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn builds_pages_and_index() {
        let tmp = tempfile::tempdir().unwrap();
        let reports = tmp.path().join("reports");
        std::fs::create_dir_all(&reports).unwrap();
        write(&reports, "report-2026-01-10.md", "# Paper Highlights\n\nToday's interesting papers.");
        write(&reports, "report-2026-01-11.md", "# More Papers\n\nAnother day of papers.");
        write(&reports, "notes.md", "# Not a report");

        let site = tmp.path().join("site");
        let count = build_site(&reports, &site).unwrap();

        assert_eq!(count, 2);
        assert!(site.join("index.html").exists());
        assert!(site.join("report-2026-01-10.html").exists());
        assert!(site.join("report-2026-01-11.html").exists());
        assert!(!site.join("notes.html").exists());

        let index = std::fs::read_to_string(site.join("index.html")).unwrap();
        let newer = index.find("More Papers").unwrap();
        let older = index.find("Paper Highlights").unwrap();
        assert!(newer < older, "index lists newest first");

        let newest = std::fs::read_to_string(site.join("report-2026-01-11.html")).unwrap();
        assert!(newest.contains(r#"class="nav-older" href="report-2026-01-10.html""#));
        assert!(!newest.contains(r#"class="nav-newer""#));
    }

    #[test]
    fn no_reports_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let reports = tmp.path().join("reports");
        std::fs::create_dir_all(&reports).unwrap();
        let site = tmp.path().join("site");

        assert_eq!(build_site(&reports, &site).unwrap(), 0);
        assert!(!site.exists());

        assert_eq!(build_site(&tmp.path().join("missing"), &site).unwrap(), 0);
    }

    #[test]
    fn rebuild_overwrites_existing_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let reports = tmp.path().join("reports");
        std::fs::create_dir_all(&reports).unwrap();
        let site = tmp.path().join("site");

        write(&reports, "report-2026-01-10.md", "# First Draft\n\nText.");
        build_site(&reports, &site).unwrap();
        write(&reports, "report-2026-01-10.md", "# Final Version\n\nText.");
        build_site(&reports, &site).unwrap();

        let page = std::fs::read_to_string(site.join("report-2026-01-10.html")).unwrap();
        assert!(page.contains("Final Version"));
        assert!(!page.contains("First Draft"));
        assert!(!site.join(".report-2026-01-10.html.tmp").exists());
    }
}
