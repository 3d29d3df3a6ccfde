//! Wikipedia Library - fetches articles through the MediaWiki parse API
//!
//! Pages are addressed by numeric page id (the graph's `dbo:wikiPageID`).
//! The symptom section is "Signs and symptoms" or "Symptoms" together with
//! its subsections, up to the next heading of the same or higher level.

use std::time::Duration;

use reqwest::blocking::Client;
use scraper::{ElementRef, Html};
use serde::Deserialize;
use tracing::debug;

use symcheck_common::config::ReferenceConfig;
use symcheck_common::{Article, ReferenceError, ReferenceId, ReferenceLibrary, ReferenceSource};

use crate::html::{heading_text, html_to_text, selector};

pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";

const SYMPTOM_SECTIONS: [&str; 2] = ["signs and symptoms", "symptoms"];

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParsedPage>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ParsedPage {
    title: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
}

pub struct WikipediaLibrary {
    http: Client,
    api_url: String,
}

impl WikipediaLibrary {
    pub fn new(config: &ReferenceConfig, user_agent: &str) -> Result<Self, ReferenceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| ReferenceError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

impl ReferenceLibrary for WikipediaLibrary {
    fn fetch(&self, reference: &ReferenceId) -> Result<Option<Article>, ReferenceError> {
        if reference.source != ReferenceSource::Wikipedia {
            return Err(ReferenceError::Unsupported(reference.source.as_str()));
        }

        debug!("Fetching Wikipedia page id {}", reference.key);
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "parse"),
                ("pageid", reference.key.as_str()),
                ("prop", "text"),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .map_err(|e| ReferenceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ReferenceError::Network(format!("HTTP {}", response.status())));
        }

        let body = response
            .text()
            .map_err(|e| ReferenceError::Network(e.to_string()))?;
        parse_response(&body)
    }
}

/// Decode a parse API response. An API error (missing page) is `Ok(None)`.
pub fn parse_response(body: &str) -> Result<Option<Article>, ReferenceError> {
    let response: ParseResponse =
        serde_json::from_str(body).map_err(|e| ReferenceError::Parse(e.to_string()))?;

    if let Some(error) = response.error {
        debug!("Wikipedia API error: {}", error.code);
        return Ok(None);
    }
    let page = response
        .parse
        .ok_or_else(|| ReferenceError::Parse("Response has neither parse nor error".to_string()))?;

    parse_page(&page.title, &page.text).map(Some)
}

/// Extract the article text and symptom section from rendered page HTML.
pub fn parse_page(title: &str, html: &str) -> Result<Article, ReferenceError> {
    let document = Html::parse_fragment(html);
    let output_selector = selector(".mw-parser-output")?;

    let (full_text, symptoms_section) = match document.select(&output_selector).next() {
        Some(output) => (html_to_text(&output.html()), symptom_section(output)),
        None => (html_to_text(html), None),
    };

    Ok(Article {
        title: title.to_string(),
        full_text,
        symptoms_section,
    })
}

/// Level and title of a heading element. Newer MediaWiki wraps headings
/// in `div.mw-heading`; older output has bare `h2`..`h6`.
fn heading(element: ElementRef) -> Option<(u8, String)> {
    let name = element.value().name();
    if let Some(level) = heading_level(name) {
        return Some((level, heading_text(element.text())));
    }
    if name == "div" && element.value().classes().any(|c| c == "mw-heading") {
        return element
            .children()
            .filter_map(ElementRef::wrap)
            .find_map(|child| {
                heading_level(child.value().name()).map(|level| (level, heading_text(child.text())))
            });
    }
    None
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn symptom_section(output: ElementRef) -> Option<String> {
    let mut level: Option<u8> = None;
    let mut parts: Vec<String> = Vec::new();

    for child in output.children().filter_map(ElementRef::wrap) {
        match (heading(child), level) {
            (Some((child_level, _)), Some(section_level)) if child_level <= section_level => break,
            (Some((_, title)), Some(_)) => parts.push(format!("{}:", title)),
            (Some((child_level, title)), None) => {
                if SYMPTOM_SECTIONS.contains(&title.to_lowercase().as_str()) {
                    level = Some(child_level);
                }
            }
            (None, Some(_)) => {
                let text = html_to_text(&child.html());
                if !text.is_empty() {
                    parts.push(text);
                }
            }
            (None, None) => {}
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_and_wrapped_headings() {
        let doc = Html::parse_fragment(
            r#"<h2>Signs and symptoms<span>[edit]</span></h2>
               <div class="mw-heading mw-heading3"><h3>Complications</h3></div>"#,
        );
        let h2 = doc.select(&selector("h2").unwrap()).next().unwrap();
        assert_eq!(heading(h2), Some((2, "Signs and symptoms".to_string())));
        let wrapped = doc.select(&selector("div.mw-heading").unwrap()).next().unwrap();
        assert_eq!(heading(wrapped), Some((3, "Complications".to_string())));
    }

    #[test]
    fn test_rejects_other_sources() {
        let library = WikipediaLibrary::new(&ReferenceConfig::default(), "test").unwrap();
        let medline = ReferenceId::new(ReferenceSource::MedlinePlus, "000080");
        assert!(matches!(
            library.fetch(&medline),
            Err(ReferenceError::Unsupported("medlineplus"))
        ));
    }
}
