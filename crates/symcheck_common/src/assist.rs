//! Generative-text assistant for the plausibility check.
//!
//! Optional and best-effort: the engine treats the assistant as a
//! text-in/text-out function and never validates what it generates. Any
//! error switches the affected disease back to the manual yes/no flow.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::evidence::Answer;

/// One question asked by the assistant and the user's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: Answer,
}

/// Everything the assistant sees about the disease under review.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistContext {
    pub disease_name: String,
    pub known_symptoms: Vec<String>,
    pub excluded_symptoms: Vec<String>,
    pub symptom_text: String,
    pub history: Vec<Exchange>,
}

impl AssistContext {
    pub fn history_text(&self) -> String {
        if self.history.is_empty() {
            return "No previous questions.".to_string();
        }
        self.history
            .iter()
            .map(|h| format!("Q: {}\nA: {}", h.question.trim(), h.answer.as_str()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Result of asking the assistant for its next move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistTurn {
    Question(String),
    /// The assistant has nothing left to ask
    Finished,
}

impl AssistTurn {
    /// Interpret a raw reply. A reply consisting of the word END stops the
    /// exchange; anything else is passed through as the question.
    pub fn from_reply(reply: &str) -> Self {
        let trimmed = reply.trim();
        let word = trimmed.trim_matches(|c: char| !c.is_alphanumeric());
        if trimmed.is_empty() || word.eq_ignore_ascii_case("end") {
            AssistTurn::Finished
        } else {
            AssistTurn::Question(trimmed.to_string())
        }
    }
}

/// Urgency categories offered to the assistant for its final assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    CriticalEmergency,
    CriticalUrgentCare,
    NonCriticalSeeDoctor,
    NonCriticalMonitor,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::CriticalEmergency,
        Severity::CriticalUrgentCare,
        Severity::NonCriticalSeeDoctor,
        Severity::NonCriticalMonitor,
    ];

    /// Wording used in the assessment prompt.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Severity::CriticalEmergency => "Critical, Call an Ambulance",
            Severity::CriticalUrgentCare => "Critical, Visit the local hospital",
            Severity::NonCriticalSeeDoctor => "Non-Critical, Visit a doctor",
            Severity::NonCriticalMonitor => "Non-Critical, Monitor the symptoms",
        }
    }

    fn markers(&self) -> &'static [&'static str] {
        match self {
            Severity::CriticalEmergency => &["call an ambulance", "ambulance", "emergency"],
            Severity::CriticalUrgentCare => &["local hospital", "urgent care", "visit the hospital"],
            Severity::NonCriticalSeeDoctor => &["visit a doctor", "see a doctor"],
            Severity::NonCriticalMonitor => &["monitor the symptoms", "monitor"],
        }
    }

    /// Best-effort: the category whose marker appears first in `text`.
    pub fn detect(text: &str) -> Option<Severity> {
        let lowered = text.to_lowercase();
        Severity::ALL
            .iter()
            .filter_map(|sev| {
                sev.markers()
                    .iter()
                    .filter_map(|m| lowered.find(m))
                    .min()
                    .map(|pos| (pos, *sev))
            })
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, sev)| sev)
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Severity::CriticalEmergency | Severity::CriticalUrgentCare)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub severity: Option<Severity>,
    pub summary: String,
}

impl Assessment {
    pub fn from_text(text: impl Into<String>) -> Self {
        let summary = text.into();
        Self {
            severity: Severity::detect(&summary),
            summary,
        }
    }
}

/// Assistant errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssistError {
    #[error("Assistant is disabled")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Assistant returned an empty response")]
    EmptyResponse,
}

/// Narrow capability the plausibility phase needs from a text generator.
///
/// `sink` receives text chunks as they are generated; implementations that
/// cannot stream call it once with the whole reply.
pub trait QuestionAssistant {
    fn next_turn(
        &self,
        ctx: &AssistContext,
        sink: &mut dyn FnMut(&str),
    ) -> Result<AssistTurn, AssistError>;

    fn assess(
        &self,
        ctx: &AssistContext,
        sink: &mut dyn FnMut(&str),
    ) -> Result<Assessment, AssistError>;
}

/// Assistant that is never available.
pub struct NoAssistant;

impl QuestionAssistant for NoAssistant {
    fn next_turn(
        &self,
        _ctx: &AssistContext,
        _sink: &mut dyn FnMut(&str),
    ) -> Result<AssistTurn, AssistError> {
        Err(AssistError::Disabled)
    }

    fn assess(
        &self,
        _ctx: &AssistContext,
        _sink: &mut dyn FnMut(&str),
    ) -> Result<Assessment, AssistError> {
        Err(AssistError::Disabled)
    }
}

/// Assistant replaying pre-recorded replies, for tests and demos.
///
/// Question replies are consumed in order; once exhausted every further
/// turn is `Finished`. The assessment reply is reused for every disease.
pub struct ScriptedAssistant {
    replies: Mutex<Vec<Result<String, AssistError>>>,
    assessment: Result<String, AssistError>,
    calls: Mutex<usize>,
}

impl ScriptedAssistant {
    pub fn new(replies: Vec<Result<String, AssistError>>, assessment: Result<String, AssistError>) -> Self {
        Self {
            replies: Mutex::new(replies),
            assessment,
            calls: Mutex::new(0),
        }
    }

    /// Script that asks the given questions, then assesses with `assessment`.
    pub fn asking(questions: &[&str], assessment: &str) -> Self {
        Self::new(
            questions.iter().map(|q| Ok(q.to_string())).collect(),
            Ok(assessment.to_string()),
        )
    }

    /// Script whose every call fails.
    pub fn failing(error: AssistError) -> Self {
        Self::new(vec![Err(error.clone())], Err(error))
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }
}

impl QuestionAssistant for ScriptedAssistant {
    fn next_turn(
        &self,
        _ctx: &AssistContext,
        sink: &mut dyn FnMut(&str),
    ) -> Result<AssistTurn, AssistError> {
        self.bump();
        let mut replies = self.replies.lock().unwrap_or_else(PoisonError::into_inner);
        if replies.is_empty() {
            return Ok(AssistTurn::Finished);
        }
        let reply = replies.remove(0)?;
        sink(&reply);
        Ok(AssistTurn::from_reply(&reply))
    }

    fn assess(
        &self,
        _ctx: &AssistContext,
        sink: &mut dyn FnMut(&str),
    ) -> Result<Assessment, AssistError> {
        self.bump();
        let text = self.assessment.clone()?;
        sink(&text);
        Ok(Assessment::from_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_reply_finishes() {
        assert_eq!(AssistTurn::from_reply("END"), AssistTurn::Finished);
        assert_eq!(AssistTurn::from_reply("  end.\n"), AssistTurn::Finished);
        assert_eq!(AssistTurn::from_reply(""), AssistTurn::Finished);
        assert_eq!(
            AssistTurn::from_reply("Do you have a stiff neck?"),
            AssistTurn::Question("Do you have a stiff neck?".to_string())
        );
    }

    #[test]
    fn test_severity_detection_uses_first_marker() {
        assert_eq!(
            Severity::detect("Assessment: Non-Critical, Visit a doctor within a week."),
            Some(Severity::NonCriticalSeeDoctor)
        );
        assert_eq!(
            Severity::detect("This is critical, call an ambulance now. Do not just monitor."),
            Some(Severity::CriticalEmergency)
        );
        assert_eq!(Severity::detect("Plausible diagnosis."), None);
    }

    #[test]
    fn test_history_text() {
        let mut ctx = AssistContext::default();
        assert_eq!(ctx.history_text(), "No previous questions.");
        ctx.history.push(Exchange {
            question: "Is your neck stiff?".to_string(),
            answer: Answer::No,
        });
        assert_eq!(ctx.history_text(), "Q: Is your neck stiff?\nA: no");
    }

    #[test]
    fn test_scripted_assistant_replays_then_finishes() {
        let assistant = ScriptedAssistant::asking(&["Q1?"], "Non-Critical, Monitor the symptoms");
        let ctx = AssistContext::default();
        let mut streamed = String::new();

        let turn = assistant.next_turn(&ctx, &mut |c| streamed.push_str(c)).unwrap();
        assert_eq!(turn, AssistTurn::Question("Q1?".to_string()));
        assert_eq!(assistant.next_turn(&ctx, &mut |_| {}).unwrap(), AssistTurn::Finished);

        let assessment = assistant.assess(&ctx, &mut |_| {}).unwrap();
        assert_eq!(assessment.severity, Some(Severity::NonCriticalMonitor));
        assert_eq!(streamed, "Q1?");
        assert_eq!(assistant.call_count(), 3);
    }

    #[test]
    fn test_no_assistant_is_disabled() {
        let ctx = AssistContext::default();
        assert_eq!(NoAssistant.next_turn(&ctx, &mut |_| {}), Err(AssistError::Disabled));
    }
}
