//! Final report of a finished session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SymcheckError};
use crate::ids::SymptomId;
use crate::plausibility::DecisionRecord;
use crate::session::{Phase, Session};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomEntry {
    pub id: SymptomId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub confirmed: Vec<SymptomEntry>,
    pub excluded: Vec<SymptomEntry>,
    pub unsure: Vec<SymptomEntry>,
    pub decisions: Vec<DecisionRecord>,
    pub questions_asked: u32,
}

impl Report {
    /// Build the report. Only finished sessions have one.
    pub fn from_session(session: &Session) -> Result<Self> {
        session.expect_phase(Phase::Done, "report")?;
        let finished_at = session
            .finished_at
            .ok_or_else(|| SymcheckError::invalid_state("finished session without end time"))?;

        let snapshot = session.evidence.snapshot();
        let entries = |ids: &std::collections::BTreeSet<SymptomId>| -> Vec<SymptomEntry> {
            ids.iter()
                .map(|id| SymptomEntry {
                    id: id.clone(),
                    label: session.label_of(id),
                })
                .collect()
        };

        Ok(Self {
            session_id: session.id,
            started_at: session.started_at,
            finished_at,
            confirmed: entries(&snapshot.confirmed),
            excluded: entries(&snapshot.excluded),
            unsure: entries(&snapshot.unsure),
            decisions: session.decisions.clone(),
            questions_asked: session.questions_asked,
        })
    }

    pub fn accepted(&self) -> impl Iterator<Item = &DecisionRecord> {
        self.decisions.iter().filter(|d| d.accepted)
    }

    /// Plain-text rendering.
    pub fn to_text(&self) -> String {
        let labels = |entries: &[SymptomEntry]| -> String {
            if entries.is_empty() {
                "none".to_string()
            } else {
                entries
                    .iter()
                    .map(|e| e.label.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        };

        let mut out = String::new();
        out.push_str(&format!("Confirmed symptoms: {}\n", labels(&self.confirmed)));
        out.push_str(&format!("Excluded symptoms:  {}\n", labels(&self.excluded)));
        if !self.unsure.is_empty() {
            out.push_str(&format!("Not sure about:     {}\n", labels(&self.unsure)));
        }
        out.push_str(&format!("Questions asked:    {}\n", self.questions_asked));
        out.push('\n');

        if self.decisions.is_empty() {
            out.push_str("No condition was reviewed.\n");
        }
        for decision in &self.decisions {
            let verdict = if decision.accepted { "plausible" } else { "rejected" };
            out.push_str(&format!("- {} ({})", decision.disease.label, verdict));
            if let Some(severity) = decision.severity {
                out.push_str(&format!(" [{}]", severity.prompt_label()));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::DiseaseRef;

    fn finished_session() -> Session {
        let mut session = Session::new();
        session.evidence.confirm(SymptomId::new("dbr:Fever")).unwrap();
        session.evidence.exclude(SymptomId::new("dbr:Cough")).unwrap();
        session.decisions.push(DecisionRecord {
            disease: DiseaseRef::new("dbr:B", "Beta fever"),
            accepted: true,
            severity: None,
            assessment: None,
        });
        session.questions_asked = 1;
        session.phase = Phase::Done;
        session.finished_at = Some(Utc::now());
        session
    }

    #[test]
    fn test_report_requires_done() {
        assert!(Report::from_session(&Session::new()).is_err());
    }

    #[test]
    fn test_report_contents() {
        let report = Report::from_session(&finished_session()).unwrap();
        assert_eq!(report.confirmed[0].label, "Fever");
        assert_eq!(report.excluded[0].id, SymptomId::new("dbr:Cough"));
        assert_eq!(report.accepted().count(), 1);

        let text = report.to_text();
        assert!(text.contains("Confirmed symptoms: Fever"));
        assert!(text.contains("- Beta fever (plausible)"));
        assert!(!text.contains("Not sure about"));
    }

    #[test]
    fn test_report_serializes() {
        let report = Report::from_session(&finished_session()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["questions_asked"], 1);
        assert_eq!(json["decisions"][0]["disease"]["id"], "dbr:B");
        assert!(json["decisions"][0].get("severity").is_none());
    }
}
