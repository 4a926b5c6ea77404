//! Corpus document preparation from exported HTML pages.
//!
//! Only lines carrying one of the left-aligned paragraph/list markers are
//! considered content. From those lines every text run between a `>` and the
//! next `<` (or the end of the line) is kept, in order.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;

/// Line markers identifying body text in the exported pages.
pub const DEFAULT_MARKERS: [&str; 3] = [
    r#"<p style="text-align: left">"#,
    r#"<p style="text-align: left;">"#,
    r#"<li style="text-align: left;">"#,
];

#[expect(clippy::expect_used)]
static TEXT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">([^<]+)(?:<|$)").expect("text run pattern is valid"));

/// Text runs of a single line.
pub fn text_runs(line: &str) -> impl Iterator<Item = &str> {
    TEXT_RUN
        .captures_iter(line)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Extract body text from HTML, one output line per marked input line.
pub fn extract_marked_text(html: &str, markers: &[&str]) -> String {
    let mut out = String::new();
    for line in html.lines() {
        if !markers.iter().any(|marker| line.contains(marker)) {
            continue;
        }
        let mut wrote = false;
        for run in text_runs(line) {
            out.push_str(run);
            wrote = true;
        }
        if wrote {
            out.push('\n');
        }
    }
    out
}

/// Convert an HTML export into a plain-text corpus document.
///
/// Returns the number of lines written. The output file is truncated.
pub fn prepare_document(input: &Path, output: &Path) -> Result<usize> {
    let bytes = std::fs::read(input)?;
    let html = String::from_utf8_lossy(&bytes);
    let text = extract_marked_text(&html, &DEFAULT_MARKERS);
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output, &text)?;
    Ok(text.lines().count())
}
