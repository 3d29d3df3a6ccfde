//! Session state
//!
//! A `Session` is owned by exactly one interaction and passed explicitly to
//! every [`Navigator`](crate::navigator::Navigator) operation. Starting over
//! means replacing it with a fresh one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::candidates::CandidateSet;
use crate::entropy::RankedSymptom;
use crate::error::{Result, SymcheckError};
use crate::evidence::Evidence;
use crate::ids::{DiseaseRef, SymptomId};
use crate::labels::LabelMap;
use crate::plausibility::{DecisionRecord, PlausibilityItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    CollectingSymptoms,
    AskingQuestions,
    PlausibilityCheck,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::CollectingSymptoms => "collecting_symptoms",
            Phase::AskingQuestions => "asking_questions",
            Phase::PlausibilityCheck => "plausibility_check",
            Phase::Done => "done",
        }
    }
}

/// A yes/no question about one symptom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub symptom: SymptomId,
    pub label: String,
    pub score: f64,
    /// 1-based position in this session
    pub number: u32,
}

/// What the session needs from the user next.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Question(Question),
    /// Nothing matches the evidence; `revise_input` returns to symptom entry
    NoMatchingCondition,
    /// The plausibility review of this disease is next
    Review(DiseaseRef),
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub(crate) id: Uuid,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) finished_at: Option<DateTime<Utc>>,
    pub(crate) phase: Phase,
    pub(crate) reported: Vec<SymptomId>,
    pub(crate) labels: LabelMap<SymptomId>,
    pub(crate) evidence: Evidence,
    pub(crate) candidates: CandidateSet,
    pub(crate) ranking: Vec<RankedSymptom>,
    pub(crate) groups: usize,
    pub(crate) question: Option<Question>,
    pub(crate) no_match: bool,
    pub(crate) reviews: Vec<PlausibilityItem>,
    pub(crate) cursor: usize,
    pub(crate) decisions: Vec<DecisionRecord>,
    pub(crate) questions_asked: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            phase: Phase::CollectingSymptoms,
            reported: Vec::new(),
            labels: LabelMap::new(),
            evidence: Evidence::new(),
            candidates: CandidateSet::default(),
            ranking: Vec::new(),
            groups: 0,
            question: None,
            no_match: false,
            reviews: Vec::new(),
            cursor: 0,
            decisions: Vec::new(),
            questions_asked: 0,
        }
    }

    /// Discard everything and start over.
    pub fn reset(&mut self) {
        *self = Session::new();
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Symptoms entered during the input phase, in entry order.
    pub fn reported(&self) -> &[SymptomId] {
        &self.reported
    }

    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    /// Candidates from the latest recomputation, narrowed by the evidence.
    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn ranking(&self) -> &[RankedSymptom] {
        &self.ranking
    }

    pub fn distinct_groups(&self) -> usize {
        self.groups
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    pub fn has_no_match(&self) -> bool {
        self.no_match
    }

    pub fn reviews(&self) -> &[PlausibilityItem] {
        &self.reviews
    }

    pub fn current_review(&self) -> Option<&PlausibilityItem> {
        if self.phase != Phase::PlausibilityCheck {
            return None;
        }
        self.reviews.get(self.cursor)
    }

    pub fn decisions(&self) -> &[DecisionRecord] {
        &self.decisions
    }

    pub fn questions_asked(&self) -> u32 {
        self.questions_asked
    }

    /// Display label of a symptom.
    pub fn label_of(&self, symptom: &SymptomId) -> String {
        self.labels.label_or_fallback(symptom)
    }

    pub(crate) fn expect_phase(&self, wanted: Phase, operation: &str) -> Result<()> {
        if self.phase == wanted {
            Ok(())
        } else {
            Err(SymcheckError::InvalidState(format!(
                "{} requires phase {}, session is in {}",
                operation,
                wanted.as_str(),
                self.phase.as_str()
            )))
        }
    }

    pub(crate) fn current_review_mut(&mut self) -> Result<&mut PlausibilityItem> {
        self.expect_phase(Phase::PlausibilityCheck, "review")?;
        let cursor = self.cursor;
        self.reviews
            .get_mut(cursor)
            .ok_or_else(|| SymcheckError::invalid_state("no disease left to review"))
    }
}
