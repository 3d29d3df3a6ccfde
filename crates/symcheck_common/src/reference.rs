//! Reference-article collaborator interface
//!
//! A missing article is a normal outcome (`Ok(None)`), distinct from a
//! failed fetch (`Err`). Both are rendered, neither stops a session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which encyclopedia a disease reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceSource {
    #[default]
    Wikipedia,
    MedlinePlus,
}

impl ReferenceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceSource::Wikipedia => "wikipedia",
            ReferenceSource::MedlinePlus => "medlineplus",
        }
    }
}

impl std::str::FromStr for ReferenceSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wikipedia" | "wiki" => Ok(ReferenceSource::Wikipedia),
            "medlineplus" | "medline" => Ok(ReferenceSource::MedlinePlus),
            other => Err(format!("unknown reference source: {}", other)),
        }
    }
}

/// Identifier of an article in a reference source (a Wikipedia page id or a
/// MedlinePlus encyclopedia article number).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceId {
    pub source: ReferenceSource,
    pub key: String,
}

impl ReferenceId {
    pub fn new(source: ReferenceSource, key: impl Into<String>) -> Self {
        Self {
            source,
            key: key.into(),
        }
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source.as_str(), self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub full_text: String,
    /// The "Symptoms" / "Signs and symptoms" section, if the article has one
    pub symptoms_section: Option<String>,
}

impl Article {
    /// Text to show for a plausibility check: the symptoms section when
    /// present, otherwise the whole article.
    pub fn description_text(&self) -> &str {
        self.symptoms_section.as_deref().unwrap_or(&self.full_text)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ReferenceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Source {0} is not supported by this library")]
    Unsupported(&'static str),
}

pub trait ReferenceLibrary {
    fn fetch(&self, reference: &ReferenceId) -> Result<Option<Article>, ReferenceError>;
}

impl<T: ReferenceLibrary + ?Sized> ReferenceLibrary for &T {
    fn fetch(&self, reference: &ReferenceId) -> Result<Option<Article>, ReferenceError> {
        (**self).fetch(reference)
    }
}

/// Outcome of looking up a disease description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Description {
    Available { title: String, text: String },
    /// The graph has no reference, or the source has no article
    NotFound,
    /// The article exists but could not be fetched
    FetchFailed { reason: String },
}

impl Description {
    pub fn from_article(article: Article) -> Self {
        let text = article.description_text().to_string();
        Description::Available {
            title: article.title,
            text,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Description::Available { .. })
    }

    /// One-line rendering for the not-available cases.
    pub fn summary(&self) -> String {
        match self {
            Description::Available { title, .. } => format!("Description: {}", title),
            Description::NotFound => "No description available".to_string(),
            Description::FetchFailed { reason } => {
                format!("Description could not be fetched ({})", reason)
            }
        }
    }
}
