//! Evidence store
//!
//! Each symptom carries exactly one status, so "confirmed and excluded at
//! the same time" cannot be represented. The store is append-only: once a
//! symptom leaves `Unknown` it never changes status again.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SymcheckError};
use crate::ids::SymptomId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SymptomStatus {
    /// Not asked and not reported
    #[default]
    Unknown,
    Confirmed,
    Excluded,
    /// Asked, but the user did not know. Never asked again, filters nothing.
    Unsure,
}

impl SymptomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymptomStatus::Unknown => "unknown",
            SymptomStatus::Confirmed => "confirmed",
            SymptomStatus::Excluded => "excluded",
            SymptomStatus::Unsure => "unsure",
        }
    }
}

/// A user's reply to a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
    Unsure,
}

impl Answer {
    /// Evidence status recorded for a symptom answered this way.
    pub fn status(&self) -> SymptomStatus {
        match self {
            Answer::Yes => SymptomStatus::Confirmed,
            Answer::No => SymptomStatus::Excluded,
            Answer::Unsure => SymptomStatus::Unsure,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Answer::Yes => "yes",
            Answer::No => "no",
            Answer::Unsure => "I don't know",
        }
    }
}

impl std::str::FromStr for Answer {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Ok(Answer::Yes),
            "n" | "no" => Ok(Answer::No),
            "?" | "u" | "unsure" | "dont know" | "don't know" | "i don't know" => {
                Ok(Answer::Unsure)
            }
            other => Err(format!("expected yes, no or unsure, got '{}'", other)),
        }
    }
}

/// Immutable copy of the evidence, handed to the resolver and the engines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSnapshot {
    pub confirmed: BTreeSet<SymptomId>,
    pub excluded: BTreeSet<SymptomId>,
    pub unsure: BTreeSet<SymptomId>,
}

impl EvidenceSnapshot {
    /// True if the symptom already has an answer and must not be asked again.
    pub fn is_answered(&self, symptom: &SymptomId) -> bool {
        self.confirmed.contains(symptom)
            || self.excluded.contains(symptom)
            || self.unsure.contains(symptom)
    }

    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty() && self.excluded.is_empty() && self.unsure.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    statuses: BTreeMap<SymptomId, SymptomStatus>,
}

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_of(&self, symptom: &SymptomId) -> SymptomStatus {
        self.statuses.get(symptom).copied().unwrap_or_default()
    }

    pub fn confirm(&mut self, symptom: SymptomId) -> Result<()> {
        self.set(symptom, SymptomStatus::Confirmed)
    }

    pub fn exclude(&mut self, symptom: SymptomId) -> Result<()> {
        self.set(symptom, SymptomStatus::Excluded)
    }

    pub fn mark_unsure(&mut self, symptom: SymptomId) -> Result<()> {
        self.set(symptom, SymptomStatus::Unsure)
    }

    /// Record an answer to an engine question.
    pub fn record(&mut self, symptom: SymptomId, answer: Answer) -> Result<()> {
        self.set(symptom, answer.status())
    }

    fn set(&mut self, symptom: SymptomId, status: SymptomStatus) -> Result<()> {
        match self.status_of(&symptom) {
            SymptomStatus::Unknown => {
                debug!("evidence: {} -> {}", symptom, status.as_str());
                self.statuses.insert(symptom, status);
                Ok(())
            }
            current if current == status => Ok(()),
            current => Err(SymcheckError::InvalidState(format!(
                "cannot mark {} as {}: already {}",
                symptom,
                status.as_str(),
                current.as_str()
            ))),
        }
    }

    pub fn snapshot(&self) -> EvidenceSnapshot {
        let mut snap = EvidenceSnapshot::default();
        for (symptom, status) in &self.statuses {
            match status {
                SymptomStatus::Confirmed => snap.confirmed.insert(symptom.clone()),
                SymptomStatus::Excluded => snap.excluded.insert(symptom.clone()),
                SymptomStatus::Unsure => snap.unsure.insert(symptom.clone()),
                SymptomStatus::Unknown => false,
            };
        }
        snap
    }

    pub fn confirmed(&self) -> impl Iterator<Item = &SymptomId> {
        self.with_status(SymptomStatus::Confirmed)
    }

    pub fn excluded(&self) -> impl Iterator<Item = &SymptomId> {
        self.with_status(SymptomStatus::Excluded)
    }

    fn with_status(&self, wanted: SymptomStatus) -> impl Iterator<Item = &SymptomId> {
        self.statuses
            .iter()
            .filter(move |(_, status)| **status == wanted)
            .map(|(symptom, _)| symptom)
    }

    /// Number of symptoms with any answer.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}
