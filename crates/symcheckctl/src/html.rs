//! HTML helpers shared by the reference-article clients

use scraper::Selector;
use symcheck_common::ReferenceError;

/// Wrap width for converted text
const TEXT_WIDTH: usize = 100;

pub fn selector(css: &str) -> Result<Selector, ReferenceError> {
    Selector::parse(css).map_err(|e| ReferenceError::Parse(e.to_string()))
}

/// Convert an HTML fragment to plain text without blank lines.
pub fn html_to_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), TEXT_WIDTH);

    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Heading text without MediaWiki's "[edit]" link, whitespace collapsed.
pub fn heading_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let raw: String = parts.collect();
    raw.replace("[edit]", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
