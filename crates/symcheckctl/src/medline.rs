//! MedlinePlus Library - fetches medical encyclopedia articles
//!
//! Articles live at `{base}/ency/article/{id}.htm`. The article body is the
//! `#d-article` element; its symptom section is the `section` whose `h2`
//! reads "Symptoms".

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use scraper::Html;
use tracing::debug;

use symcheck_common::config::ReferenceConfig;
use symcheck_common::{Article, ReferenceError, ReferenceId, ReferenceLibrary, ReferenceSource};

use crate::html::{heading_text, html_to_text, selector};

pub const DEFAULT_BASE_URL: &str = "https://medlineplus.gov";

pub struct MedlinePlusLibrary {
    http: Client,
    base_url: String,
}

impl MedlinePlusLibrary {
    pub fn new(config: &ReferenceConfig, user_agent: &str) -> Result<Self, ReferenceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| ReferenceError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn article_url(&self, key: &str) -> String {
        format!("{}/ency/article/{}.htm", self.base_url, key)
    }
}

impl ReferenceLibrary for MedlinePlusLibrary {
    fn fetch(&self, reference: &ReferenceId) -> Result<Option<Article>, ReferenceError> {
        if reference.source != ReferenceSource::MedlinePlus {
            return Err(ReferenceError::Unsupported(reference.source.as_str()));
        }

        let url = self.article_url(&reference.key);
        debug!("Fetching MedlinePlus article: {}", url);
        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| ReferenceError::Network(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ReferenceError::Network(format!("HTTP {}", response.status())));
        }

        let html = response
            .text()
            .map_err(|e| ReferenceError::Network(e.to_string()))?;
        parse_article(&html).map(Some)
    }
}

/// Extract title, body and symptom section from an article page.
pub fn parse_article(html: &str) -> Result<Article, ReferenceError> {
    let document = Html::parse_document(html);

    let title_selector = selector("h1")?;
    let title = document
        .select(&title_selector)
        .next()
        .map(|el| heading_text(el.text()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let body_selector = selector("#d-article")?;
    let body = document
        .select(&body_selector)
        .next()
        .ok_or_else(|| ReferenceError::Parse("No article body found".to_string()))?;

    let section_selector = selector("section")?;
    let h2_selector = selector("h2")?;
    let section_body_selector = selector(".section-body")?;

    let symptoms_section = body
        .select(&section_selector)
        .find(|section| {
            section
                .select(&h2_selector)
                .next()
                .map(|h2| heading_text(h2.text()).eq_ignore_ascii_case("symptoms"))
                .unwrap_or(false)
        })
        .map(|section| match section.select(&section_body_selector).next() {
            Some(content) => html_to_text(&content.html()),
            None => html_to_text(&section.html()),
        })
        .filter(|text| !text.is_empty());

    Ok(Article {
        title,
        full_text: html_to_text(&body.html()),
        symptoms_section,
    })
}
