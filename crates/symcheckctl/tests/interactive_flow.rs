//! End-to-end runs of the terminal flow over scripted input

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;

use symcheck_common::assist::ScriptedAssistant;
use symcheck_common::memory::{InMemoryGraph, InMemoryLibrary};
use symcheck_common::{
    Article, DiseaseId, DiseaseRef, GraphError, KnowledgeGraph, LabelMap, Navigator,
    NavigatorSettings, Phase, ReferenceId, ReferenceSource, RetryPolicy, Session, Severity,
    SymptomId,
};
use symcheckctl::interactive::{run_check, Outcome, Terminal};

fn settings() -> NavigatorSettings {
    NavigatorSettings {
        retry: RetryPolicy::immediate(3),
        ..Default::default()
    }
}

fn graph() -> InMemoryGraph {
    InMemoryGraph::new()
        .with_disease("dbr:A", "Alpha fever", &["dbr:Fever", "dbr:Cough"])
        .with_disease("dbr:B", "Beta fever", &["dbr:Fever", "dbr:Rash"])
        .with_disease("dbr:C", "Gamma fever", &["dbr:Fever", "dbr:Cough"])
}

fn run(
    nav: &Navigator,
    session: &mut Session,
    script: &str,
    preset: &[&str],
) -> (Outcome, String) {
    let mut term = Terminal::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());
    let preset: Vec<String> = preset.iter().map(|s| s.to_string()).collect();
    let outcome = run_check(nav, session, &mut term, &preset).unwrap();
    let output = String::from_utf8(term.into_output()).unwrap();
    (outcome, output)
}

#[test]
fn test_search_question_and_manual_review() {
    let graph = graph();
    let library = InMemoryLibrary::new();
    let nav = Navigator::new(&graph, &library, settings());
    let mut session = Session::new();

    // "fe" matches only Fever; Cough is asked first and answered no
    let (outcome, output) = run(&nav, &mut session, "fe\ndone\nn\ny\n", &[]);

    let Outcome::Finished(report) = outcome else {
        panic!("check did not finish");
    };
    assert!(output.contains("Cough?"));
    assert!(output.contains("Beta fever"));
    assert!(output.contains("No description available"));

    assert_eq!(report.confirmed[0].id, SymptomId::new("dbr:Fever"));
    assert_eq!(report.excluded[0].id, SymptomId::new("dbr:Cough"));
    assert_eq!(report.questions_asked, 1);
    assert_eq!(report.decisions.len(), 1);
    assert!(report.decisions[0].accepted);
    assert_eq!(report.decisions[0].disease.id.as_str(), "dbr:B");
}

#[test]
fn test_assistant_exchange_and_assessment() {
    let wiki = ReferenceId::new(ReferenceSource::Wikipedia, "42");
    let graph = graph().with_reference("dbr:B", wiki.clone());
    let library = InMemoryLibrary::new().with_article(
        wiki,
        Article {
            title: "Beta fever".to_string(),
            full_text: "Beta fever is an illness.".to_string(),
            symptoms_section: Some("Fever followed by a rash on the chest.".to_string()),
        },
    );
    let assistant = ScriptedAssistant::asking(
        &["Did the rash start on your chest?"],
        "Plausible. Non-Critical, Visit a doctor",
    );
    let nav = Navigator::new(&graph, &library, settings()).with_assistant(&assistant);
    let mut session = Session::new();

    let (outcome, output) = run(&nav, &mut session, "done\nn\ny\ny\n", &["Fever"]);

    let Outcome::Finished(report) = outcome else {
        panic!("check did not finish");
    };
    assert!(output.contains("Fever followed by a rash on the chest."));
    assert!(output.contains("Did the rash start on your chest?"));
    assert!(output.contains("Non-Critical, Visit a doctor"));
    // one question, then Finished, then the assessment
    assert_eq!(assistant.call_count(), 3);

    let decision = &report.decisions[0];
    assert_eq!(decision.severity, Some(Severity::NonCriticalSeeDoctor));
    assert!(decision.accepted);
    assert_eq!(session.reviews()[0].transcript.len(), 1);
}

fn disjoint_graph() -> InMemoryGraph {
    InMemoryGraph::new()
        .with_disease("dbr:A", "Alpha fever", &["dbr:Fever", "dbr:Cough"])
        .with_disease("dbr:B", "Beta rash", &["dbr:Rash", "dbr:Itch"])
}

#[test]
fn test_no_match_then_revise() {
    let graph = disjoint_graph();
    let library = InMemoryLibrary::new();
    let nav = Navigator::new(&graph, &library, settings());
    let mut session = Session::new();

    // nothing has both; withdraw Rash and go again
    let script = "done\ny\n-2\ndone\nn\n";
    let (outcome, output) = run(&nav, &mut session, script, &["Fever", "Rash"]);

    let Outcome::Finished(report) = outcome else {
        panic!("check did not finish");
    };
    assert!(output.contains("No known condition matches"));
    assert_eq!(report.confirmed.len(), 1);
    assert_eq!(report.confirmed[0].label, "Fever");
    assert_eq!(report.decisions.len(), 1);
    assert_eq!(report.decisions[0].disease.id.as_str(), "dbr:A");
    assert!(!report.decisions[0].accepted);
}

#[test]
fn test_pick_from_search_results() {
    let graph = disjoint_graph();
    let library = InMemoryLibrary::new();
    let nav = Navigator::new(&graph, &library, settings());
    let mut session = Session::new();

    // "r" lists Fever and Rash
    let (outcome, output) = run(&nav, &mut session, "r\n2\ndone\ny\n", &[]);

    let Outcome::Finished(report) = outcome else {
        panic!("check did not finish");
    };
    assert!(output.contains("Fever"));
    assert_eq!(report.confirmed[0].label, "Rash");
    assert_eq!(report.decisions[0].disease.id.as_str(), "dbr:B");
    assert!(report.decisions[0].accepted);
}

#[test]
fn test_quit_and_end_of_input() {
    let graph = graph();
    let library = InMemoryLibrary::new();
    let nav = Navigator::new(&graph, &library, settings());

    let mut session = Session::new();
    let (outcome, _) = run(&nav, &mut session, "quit\n", &["Fever"]);
    assert!(matches!(outcome, Outcome::Quit));
    assert_eq!(session.phase(), Phase::CollectingSymptoms);

    let mut session = Session::new();
    let (outcome, _) = run(&nav, &mut session, "done\n", &["Fever"]);
    assert!(matches!(outcome, Outcome::Quit));
    assert_eq!(session.phase(), Phase::AskingQuestions);
}

#[test]
fn test_unknown_preset_symptom_is_reported_not_fatal() {
    let graph = graph();
    let library = InMemoryLibrary::new();
    let nav = Navigator::new(&graph, &library, settings());
    let mut session = Session::new();

    let (outcome, output) = run(&nav, &mut session, "quit\n", &["Purple spots"]);
    assert!(matches!(outcome, Outcome::Quit));
    assert!(output.contains("Unknown symptom: Purple spots"));
    assert!(session.reported().is_empty());
}

#[test]
fn test_graph_outage_during_answer_can_be_retried() {
    let graph = graph();
    let library = InMemoryLibrary::new();
    let nav = Navigator::new(&graph, &library, settings());
    let mut session = Session::new();

    let mut term = Terminal::new(Cursor::new(b"done\n".to_vec()), Vec::new());
    let preset = vec!["Fever".to_string()];
    // finish_input succeeds, then input runs out at the first question
    let outcome = run_check(&nav, &mut session, &mut term, &preset).unwrap();
    assert!(matches!(outcome, Outcome::Quit));
    let question = session.current_question().cloned().unwrap();

    graph.fail_next(3);
    assert!(nav.answer(&mut session, symcheck_common::Answer::No).is_err());
    assert_eq!(session.current_question(), Some(&question));
    assert!(session.evidence().excluded().next().is_none());

    let step = nav.answer(&mut session, symcheck_common::Answer::No).unwrap();
    assert!(matches!(step, symcheck_common::Step::Review(_)));
}

/// Graph whose full symptom list is unavailable for the first few calls.
struct LabelOutage {
    inner: InMemoryGraph,
    failures: Cell<u32>,
}

impl LabelOutage {
    fn new(inner: InMemoryGraph, failures: u32) -> Self {
        Self {
            inner,
            failures: Cell::new(failures),
        }
    }
}

impl KnowledgeGraph for LabelOutage {
    fn all_symptoms(&self) -> Result<LabelMap<SymptomId>, GraphError> {
        if self.failures.get() > 0 {
            self.failures.set(self.failures.get() - 1);
            return Err(GraphError::Transport("down".to_string()));
        }
        self.inner.all_symptoms()
    }

    fn co_occurring_symptoms(
        &self,
        confirmed: &BTreeSet<SymptomId>,
    ) -> Result<LabelMap<SymptomId>, GraphError> {
        self.inner.co_occurring_symptoms(confirmed)
    }

    fn diseases_with_symptoms(
        &self,
        symptoms: &BTreeSet<SymptomId>,
    ) -> Result<Vec<DiseaseRef>, GraphError> {
        self.inner.diseases_with_symptoms(symptoms)
    }

    fn symptoms_of_disease(
        &self,
        disease: &DiseaseId,
        exclude: &BTreeSet<SymptomId>,
    ) -> Result<BTreeSet<SymptomId>, GraphError> {
        self.inner.symptoms_of_disease(disease, exclude)
    }

    fn disease_profiles(
        &self,
        diseases: &[DiseaseId],
    ) -> Result<BTreeMap<DiseaseId, BTreeSet<SymptomId>>, GraphError> {
        self.inner.disease_profiles(diseases)
    }

    fn reference_of(
        &self,
        disease: &DiseaseId,
        source: ReferenceSource,
    ) -> Result<Option<ReferenceId>, GraphError> {
        self.inner.reference_of(disease, source)
    }
}

#[test]
fn test_graph_outage_while_adding_symptom_reprompts() {
    // one full retry round fails
    let graph = LabelOutage::new(graph(), 3);
    let library = InMemoryLibrary::new();
    let nav = Navigator::new(&graph, &library, settings());
    let mut session = Session::new();

    let (outcome, output) = run(&nav, &mut session, "fe\nfe\ndone\nn\ny\n", &[]);

    let Outcome::Finished(report) = outcome else {
        panic!("check did not finish");
    };
    assert!(output.contains("all_symptoms failed after 3 attempts"));
    assert!(output.contains("symptom not added"));
    assert_eq!(graph.failures.get(), 0);
    assert_eq!(report.confirmed.len(), 1);
    assert_eq!(report.confirmed[0].id, SymptomId::new("dbr:Fever"));
    assert_eq!(report.decisions[0].disease.id.as_str(), "dbr:B");
}

#[test]
fn test_graph_outage_on_preset_symptom_is_not_fatal() {
    let graph = LabelOutage::new(graph(), 3);
    let library = InMemoryLibrary::new();
    let nav = Navigator::new(&graph, &library, settings());
    let mut session = Session::new();

    let (outcome, output) = run(&nav, &mut session, "quit\n", &["Fever"]);

    assert!(matches!(outcome, Outcome::Quit));
    assert!(output.contains("Fever not added"));
    assert!(session.reported().is_empty());
    assert_eq!(session.phase(), Phase::CollectingSymptoms);
}

// ============================================================================
// Starting over
// ============================================================================

#[test]
fn test_new_during_questions_starts_over() {
    let graph = graph();
    let library = InMemoryLibrary::new();
    let nav = Navigator::new(&graph, &library, settings());
    let mut session = Session::new();
    let first_id = session.id();

    // Rash alone leaves only Beta fever, which goes straight to review
    let script = "fever\ndone\nnew\nrash\ndone\ny\n";
    let (outcome, output) = run(&nav, &mut session, script, &[]);

    let Outcome::Finished(report) = outcome else {
        panic!("check did not finish");
    };
    assert!(output.contains("Cough?"));
    assert!(output.contains("Started a new session"));
    assert!(!output.contains("Please answer"));
    assert_ne!(session.id(), first_id);
    assert_eq!(report.session_id, session.id());
    assert_eq!(report.questions_asked, 0);
    assert_eq!(report.confirmed.len(), 1);
    assert_eq!(report.confirmed[0].id, SymptomId::new("dbr:Rash"));
    assert_eq!(report.decisions.len(), 1);
    assert_eq!(report.decisions[0].disease.id.as_str(), "dbr:B");
}

#[test]
fn test_new_during_review_and_entry() {
    let graph = graph();
    let library = InMemoryLibrary::new();
    let nav = Navigator::new(&graph, &library, settings());

    let mut session = Session::new();
    let (outcome, output) = run(&nav, &mut session, "done\nnew\nquit\n", &["Rash"]);
    assert!(matches!(outcome, Outcome::Quit));
    assert!(output.contains("Beta fever"));
    assert!(output.contains("Started a new session"));
    assert_eq!(session.phase(), Phase::CollectingSymptoms);
    assert!(session.reported().is_empty());
    assert!(session.decisions().is_empty());

    let mut session = Session::new();
    let (outcome, _) = run(&nav, &mut session, "new\nquit\n", &["Fever"]);
    assert!(matches!(outcome, Outcome::Quit));
    assert!(session.reported().is_empty());
}
