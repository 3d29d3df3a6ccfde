//! Plausibility review of the remaining candidates, one disease at a time.

use serde::{Deserialize, Serialize};

use crate::assist::{Assessment, Exchange};
use crate::ids::{DiseaseRef, SymptomId};
use crate::reference::Description;

/// Whether the assistant is mediating the review of a disease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum AssistStatus {
    /// No assistant configured
    Inactive,
    Active,
    /// The assistant failed; the review continues manually
    FellBack(String),
}

impl AssistStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, AssistStatus::Active)
    }
}

/// Material gathered for one disease when its review starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewMaterial {
    pub description: Description,
    /// Profile minus excluded symptoms, as `(id, label)`
    pub symptoms: Vec<(SymptomId, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlausibilityItem {
    pub disease: DiseaseRef,
    pub material: Option<ReviewMaterial>,
    pub transcript: Vec<Exchange>,
    pub pending_question: Option<String>,
    pub assessment: Option<Assessment>,
    pub assist: AssistStatus,
}

impl PlausibilityItem {
    pub fn new(disease: DiseaseRef, assist: AssistStatus) -> Self {
        Self {
            disease,
            material: None,
            transcript: Vec::new(),
            pending_question: None,
            assessment: None,
            assist,
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.material.is_some()
    }

    pub fn description(&self) -> Option<&Description> {
        self.material.as_ref().map(|m| &m.description)
    }

    pub(crate) fn fall_back(&mut self, reason: impl Into<String>) {
        self.pending_question = None;
        self.assist = AssistStatus::FellBack(reason.into());
    }
}

/// Accept/reject decision for one disease, as it appears in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub disease: DiseaseRef,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<crate::assist::Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<String>,
}

impl DecisionRecord {
    pub fn from_item(item: &PlausibilityItem, accepted: bool) -> Self {
        Self {
            disease: item.disease.clone(),
            accepted,
            severity: item.assessment.as_ref().and_then(|a| a.severity),
            assessment: item.assessment.as_ref().map(|a| a.summary.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assist::Severity;

    #[test]
    fn test_decision_carries_assessment() {
        let mut item = PlausibilityItem::new(DiseaseRef::new("dbr:Flu", "Flu"), AssistStatus::Active);
        item.assessment = Some(Assessment::from_text("Non-Critical, Visit a doctor"));
        let record = DecisionRecord::from_item(&item, true);
        assert!(record.accepted);
        assert_eq!(record.severity, Some(Severity::NonCriticalSeeDoctor));
    }

    #[test]
    fn test_fall_back_clears_pending_question() {
        let mut item = PlausibilityItem::new(DiseaseRef::new("dbr:Flu", "Flu"), AssistStatus::Active);
        item.pending_question = Some("Q?".to_string());
        item.fall_back("HTTP error: 500");
        assert!(item.pending_question.is_none());
        assert!(!item.assist.is_active());
    }
}
