//! Navigator - drives a session through its phases
//!
//! CollectingSymptoms -> AskingQuestions -> PlausibilityCheck -> Done.
//! Each operation performs one unit of work against the collaborators and
//! either advances the session or leaves it untouched on error. Evidence is
//! committed only after the graph lookups for the new evidence succeeded.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::assist::{AssistContext, AssistTurn, Assessment, Exchange, QuestionAssistant};
use crate::candidates::{CandidateResolver, CandidateSet, ExclusionPolicy};
use crate::config::SymcheckConfig;
use crate::distinct::remaining_distinct_groups;
use crate::entropy::rank;
use crate::error::{Result, SymcheckError};
use crate::evidence::{Answer, Evidence};
use crate::graph::KnowledgeGraph;
use crate::ids::{DiseaseRef, SymptomId};
use crate::labels::LabelMap;
use crate::plausibility::{AssistStatus, DecisionRecord, PlausibilityItem, ReviewMaterial};
use crate::reference::{Description, ReferenceLibrary, ReferenceSource};
use crate::report::Report;
use crate::retry::RetryPolicy;
use crate::session::{Phase, Question, Session, Step};

#[derive(Debug, Clone)]
pub struct NavigatorSettings {
    pub retry: RetryPolicy,
    pub exclusion_policy: ExclusionPolicy,
    /// Hand off to the plausibility check after this many questions
    pub max_questions: Option<u32>,
    /// Assistant questions per disease before the assessment
    pub assistant_questions: u32,
    pub reference_source: ReferenceSource,
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            exclusion_policy: ExclusionPolicy::default(),
            max_questions: None,
            assistant_questions: 3,
            reference_source: ReferenceSource::default(),
        }
    }
}

impl NavigatorSettings {
    pub fn from_config(config: &SymcheckConfig) -> Self {
        Self {
            retry: config.retry.policy(),
            exclusion_policy: config.engine.exclusion_policy,
            max_questions: config.engine.max_questions,
            assistant_questions: config.assistant.effective_max_questions(),
            reference_source: config.reference.source,
        }
    }
}

/// Outcome of an assistant interaction during a review.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistStep {
    /// Yes/no question generated by the assistant
    Question(String),
    Assessment(Assessment),
    /// No assistant, or it failed: review this disease manually
    Manual,
}

pub struct Navigator<'a> {
    graph: &'a dyn KnowledgeGraph,
    library: &'a dyn ReferenceLibrary,
    assistant: Option<&'a dyn QuestionAssistant>,
    settings: NavigatorSettings,
}

impl<'a> Navigator<'a> {
    pub fn new(
        graph: &'a dyn KnowledgeGraph,
        library: &'a dyn ReferenceLibrary,
        settings: NavigatorSettings,
    ) -> Self {
        Self {
            graph,
            library,
            assistant: None,
            settings,
        }
    }

    pub fn with_assistant(mut self, assistant: &'a dyn QuestionAssistant) -> Self {
        self.assistant = Some(assistant);
        self
    }

    pub fn settings(&self) -> &NavigatorSettings {
        &self.settings
    }

    fn resolver(&self) -> CandidateResolver<'a> {
        CandidateResolver::new(self.graph, self.settings.retry)
    }

    fn ensure_labels(&self, session: &mut Session) -> Result<()> {
        if session.labels.is_empty() {
            let labels = self
                .settings
                .retry
                .run("all_symptoms", || self.graph.all_symptoms())?;
            debug!("loaded {} symptom labels", labels.len());
            session.labels = labels;
        }
        Ok(())
    }

    // ---- CollectingSymptoms ------------------------------------------------

    /// Add a symptom by label (case-insensitive) or identifier.
    pub fn report_symptom(&self, session: &mut Session, input: &str) -> Result<SymptomId> {
        session.expect_phase(Phase::CollectingSymptoms, "report_symptom")?;
        self.ensure_labels(session)?;

        let input = input.trim();
        let id = match session.labels.resolve_label(input) {
            Some(id) => id.clone(),
            None => {
                let id = SymptomId::new(input);
                if !session.labels.contains_id(&id) {
                    return Err(SymcheckError::UnknownSymptom(input.to_string()));
                }
                id
            }
        };

        if !session.reported.contains(&id) {
            info!("Reported symptom {}", id);
            session.reported.push(id.clone());
        }
        Ok(id)
    }

    /// Remove a reported symptom. Returns false if it was not reported.
    pub fn withdraw_symptom(&self, session: &mut Session, symptom: &SymptomId) -> Result<bool> {
        session.expect_phase(Phase::CollectingSymptoms, "withdraw_symptom")?;
        let before = session.reported.len();
        session.reported.retain(|s| s != symptom);
        Ok(session.reported.len() != before)
    }

    /// Symptoms co-occurring with everything reported so far, minus the
    /// reported ones themselves.
    pub fn symptom_choices(&self, session: &Session) -> Result<LabelMap<SymptomId>> {
        session.expect_phase(Phase::CollectingSymptoms, "symptom_choices")?;
        let reported: BTreeSet<SymptomId> = session.reported.iter().cloned().collect();
        let choices = self
            .settings
            .retry
            .run("co_occurring_symptoms", || self.graph.co_occurring_symptoms(&reported))?;
        Ok(choices.retain_ids(|id| !reported.contains(id)))
    }

    /// Commit the reported symptoms and ask the first question.
    pub fn finish_input(&self, session: &mut Session) -> Result<Step> {
        session.expect_phase(Phase::CollectingSymptoms, "finish_input")?;
        self.ensure_labels(session)?;

        let mut evidence = Evidence::new();
        for symptom in &session.reported {
            evidence.confirm(symptom.clone())?;
        }
        let confirmed: BTreeSet<SymptomId> = session.reported.iter().cloned().collect();
        let resolved = self.resolver().resolve(&confirmed)?;

        session.evidence = evidence;
        session.phase = Phase::AskingQuestions;
        info!(
            "Session {}: {} reported symptoms, asking questions",
            session.id,
            session.reported.len()
        );
        Ok(self.advance(session, resolved))
    }

    // ---- AskingQuestions ---------------------------------------------------

    /// Answer the pending question and recompute.
    pub fn answer(&self, session: &mut Session, answer: Answer) -> Result<Step> {
        session.expect_phase(Phase::AskingQuestions, "answer")?;
        let question = session
            .question
            .clone()
            .ok_or_else(|| SymcheckError::invalid_state("no question is pending"))?;

        let mut evidence = session.evidence.clone();
        evidence.record(question.symptom.clone(), answer)?;
        let confirmed: BTreeSet<SymptomId> = evidence.confirmed().cloned().collect();
        let resolved = self.resolver().resolve(&confirmed)?;

        debug!("Q{} {} -> {}", question.number, question.symptom, answer.as_str());
        session.evidence = evidence;
        session.questions_asked += 1;
        Ok(self.advance(session, resolved))
    }

    /// Back to symptom entry after no condition matched. Reported symptoms
    /// are kept; evidence starts over.
    pub fn revise_input(&self, session: &mut Session) -> Result<()> {
        session.expect_phase(Phase::AskingQuestions, "revise_input")?;
        if !session.no_match {
            return Err(SymcheckError::invalid_state(
                "revise_input is only available when no condition matched",
            ));
        }
        session.phase = Phase::CollectingSymptoms;
        session.evidence = Evidence::new();
        session.candidates = CandidateSet::default();
        session.ranking.clear();
        session.groups = 0;
        session.question = None;
        session.no_match = false;
        session.questions_asked = 0;
        info!("Session {}: revising symptoms", session.id);
        Ok(())
    }

    /// One recomputation cycle over freshly resolved candidates.
    fn advance(&self, session: &mut Session, resolved: CandidateSet) -> Step {
        let snapshot = session.evidence.snapshot();
        let narrowed = resolved.narrow(&snapshot, self.settings.exclusion_policy);
        session.question = None;

        if narrowed.is_empty() {
            info!("Session {}: no matching condition", session.id);
            session.no_match = true;
            session.candidates = narrowed;
            session.ranking.clear();
            session.groups = 0;
            return Step::NoMatchingCondition;
        }
        session.no_match = false;

        let groups = remaining_distinct_groups(&narrowed, &snapshot.excluded);
        let ranking = rank(&narrowed, &snapshot);
        debug!(
            "recompute: {} candidates, {} distinct groups, top {:?}",
            narrowed.len(),
            groups,
            ranking.first().map(|r| (r.symptom.as_str(), r.score))
        );
        session.groups = groups;
        session.ranking = ranking;
        session.candidates = narrowed;

        let cap_reached = self
            .settings
            .max_questions
            .is_some_and(|cap| session.questions_asked >= cap);
        let top = session.ranking.iter().find(|r| r.is_informative()).cloned();

        match top {
            Some(top) if groups > 1 && !cap_reached => {
                let question = Question {
                    label: session.label_of(&top.symptom),
                    symptom: top.symptom,
                    score: top.score,
                    number: session.questions_asked + 1,
                };
                session.question = Some(question.clone());
                Step::Question(question)
            }
            _ => {
                if cap_reached {
                    info!("Question limit reached with {} groups left", groups);
                }
                self.enter_plausibility(session)
            }
        }
    }

    // ---- PlausibilityCheck -------------------------------------------------

    fn enter_plausibility(&self, session: &mut Session) -> Step {
        let assist = if self.assistant.is_some() {
            AssistStatus::Active
        } else {
            AssistStatus::Inactive
        };
        session.reviews = session
            .candidates
            .diseases()
            .map(|d| PlausibilityItem::new(d.clone(), assist.clone()))
            .collect();
        session.cursor = 0;
        session.phase = Phase::PlausibilityCheck;
        info!(
            "Session {}: plausibility check of {} candidates",
            session.id,
            session.reviews.len()
        );
        match session.reviews.first() {
            Some(item) => Step::Review(item.disease.clone()),
            None => self.finish(session),
        }
    }

    /// The disease under review, with its description and remaining
    /// symptoms fetched on first access. A failed graph lookup leaves the
    /// review unprepared so the call can be repeated.
    pub fn review<'s>(&self, session: &'s mut Session) -> Result<&'s PlausibilityItem> {
        let item = session.current_review_mut()?;
        if item.material.is_none() {
            let disease = item.disease.clone();
            let excluded = session.evidence.snapshot().excluded;
            let material = self.gather(&disease, &excluded, &session.labels)?;
            session.current_review_mut()?.material = Some(material);
        }
        let item = session.current_review_mut()?;
        Ok(item)
    }

    fn gather(
        &self,
        disease: &DiseaseRef,
        excluded: &BTreeSet<SymptomId>,
        labels: &LabelMap<SymptomId>,
    ) -> Result<ReviewMaterial> {
        let retry = self.settings.retry;
        let symptoms = retry.run("symptoms_of_disease", || {
            self.graph.symptoms_of_disease(&disease.id, excluded)
        })?;
        let reference = retry.run("reference_of", || {
            self.graph.reference_of(&disease.id, self.settings.reference_source)
        })?;

        let description = match reference {
            None => Description::NotFound,
            Some(reference) => match self.library.fetch(&reference) {
                Ok(Some(article)) => Description::from_article(article),
                Ok(None) => Description::NotFound,
                Err(e) => {
                    warn!("Reference {} for {} failed: {}", reference, disease.id, e);
                    Description::FetchFailed {
                        reason: e.to_string(),
                    }
                }
            },
        };

        Ok(ReviewMaterial {
            description,
            symptoms: symptoms
                .into_iter()
                .map(|s| {
                    let label = labels.label_or_fallback(&s);
                    (s, label)
                })
                .collect(),
        })
    }

    fn assist_context(&self, session: &Session, item: &PlausibilityItem) -> AssistContext {
        let symptom_text = match item.description() {
            Some(Description::Available { text, .. }) => text.clone(),
            _ => item
                .material
                .as_ref()
                .map(|m| {
                    m.symptoms
                        .iter()
                        .map(|(_, label)| label.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default(),
        };
        AssistContext {
            disease_name: item.disease.label.clone(),
            known_symptoms: session.evidence.confirmed().map(|s| session.label_of(s)).collect(),
            excluded_symptoms: session.evidence.excluded().map(|s| session.label_of(s)).collect(),
            symptom_text,
            history: item.transcript.clone(),
        }
    }

    fn reviewing<'s>(&self, session: &'s Session) -> Result<&'s PlausibilityItem> {
        session.expect_phase(Phase::PlausibilityCheck, "review")?;
        session
            .current_review()
            .ok_or_else(|| SymcheckError::invalid_state("no disease left to review"))
    }

    /// Ask the assistant for its next question about the disease under
    /// review. Once the question cap is reached, or the assistant says it
    /// is finished, this produces the assessment instead.
    pub fn assistant_turn(&self, session: &mut Session, sink: &mut dyn FnMut(&str)) -> Result<AssistStep> {
        self.review(session)?;
        let Some(assistant) = self.assistant else {
            return Ok(AssistStep::Manual);
        };

        let item = self.reviewing(session)?;
        if !item.assist.is_active() {
            return Ok(AssistStep::Manual);
        }
        if let Some(assessment) = &item.assessment {
            return Ok(AssistStep::Assessment(assessment.clone()));
        }
        if let Some(question) = &item.pending_question {
            return Ok(AssistStep::Question(question.clone()));
        }
        if item.transcript.len() >= self.settings.assistant_questions as usize {
            return self.assess(session, sink);
        }

        let ctx = self.assist_context(session, item);
        let result = assistant.next_turn(&ctx, sink);
        match result {
            Ok(AssistTurn::Question(question)) => {
                session.current_review_mut()?.pending_question = Some(question.clone());
                Ok(AssistStep::Question(question))
            }
            Ok(AssistTurn::Finished) => self.assess(session, sink),
            Err(e) => {
                warn!("Assistant failed for {}, continuing manually: {}", ctx.disease_name, e);
                session.current_review_mut()?.fall_back(e.to_string());
                Ok(AssistStep::Manual)
            }
        }
    }

    /// Record the user's answer to the pending assistant question.
    pub fn answer_assistant(&self, session: &mut Session, answer: Answer) -> Result<()> {
        let item = session.current_review_mut()?;
        let question = item
            .pending_question
            .take()
            .ok_or_else(|| SymcheckError::invalid_state("no assistant question is pending"))?;
        item.transcript.push(Exchange { question, answer });
        Ok(())
    }

    /// Ask the assistant for its final assessment of the disease under review.
    pub fn assess(&self, session: &mut Session, sink: &mut dyn FnMut(&str)) -> Result<AssistStep> {
        self.review(session)?;
        let Some(assistant) = self.assistant else {
            return Ok(AssistStep::Manual);
        };

        let item = self.reviewing(session)?;
        if !item.assist.is_active() {
            return Ok(AssistStep::Manual);
        }
        if let Some(assessment) = &item.assessment {
            return Ok(AssistStep::Assessment(assessment.clone()));
        }

        let ctx = self.assist_context(session, item);
        let result = assistant.assess(&ctx, sink);
        let item = session.current_review_mut()?;
        match result {
            Ok(assessment) => {
                debug!("Assessment for {}: {:?}", ctx.disease_name, assessment.severity);
                item.pending_question = None;
                item.assessment = Some(assessment.clone());
                Ok(AssistStep::Assessment(assessment))
            }
            Err(e) => {
                warn!("Assistant assessment failed for {}: {}", ctx.disease_name, e);
                item.fall_back(e.to_string());
                Ok(AssistStep::Manual)
            }
        }
    }

    /// Accept or reject the disease under review and move to the next one.
    pub fn decide(&self, session: &mut Session, accept: bool) -> Result<Step> {
        let item = session.current_review_mut()?;
        item.pending_question = None;
        let record = DecisionRecord::from_item(item, accept);
        info!(
            "{} {}",
            if accept { "Accepted" } else { "Rejected" },
            record.disease.id
        );
        session.decisions.push(record);
        session.cursor += 1;

        match session.reviews.get(session.cursor) {
            Some(next) => Ok(Step::Review(next.disease.clone())),
            None => Ok(self.finish(session)),
        }
    }

    fn finish(&self, session: &mut Session) -> Step {
        session.phase = Phase::Done;
        session.finished_at = Some(chrono::Utc::now());
        info!(
            "Session {} done: {} questions, {} decisions",
            session.id,
            session.questions_asked,
            session.decisions.len()
        );
        Step::Done
    }

    // ---- Done --------------------------------------------------------------

    pub fn report(&self, session: &Session) -> Result<Report> {
        Report::from_session(session)
    }
}
