//! Offline demo collaborators
//!
//! A small fixed disease/symptom graph and a matching article library so
//! the interactive flow can be tried without network access.

use symcheck_common::memory::{InMemoryGraph, InMemoryLibrary};
use symcheck_common::{Article, ReferenceId, ReferenceSource};

const DISEASES: &[(&str, &str, &[&str])] = &[
    (
        "dbr:Influenza",
        "Influenza",
        &["dbr:Fever", "dbr:Cough", "dbr:Myalgia", "dbr:Headache", "dbr:Fatigue"],
    ),
    (
        "dbr:Common_cold",
        "Common cold",
        &["dbr:Cough", "dbr:Rhinorrhea", "dbr:Sore_throat", "dbr:Sneeze"],
    ),
    (
        "dbr:COVID-19",
        "COVID-19",
        &["dbr:Fever", "dbr:Cough", "dbr:Fatigue", "dbr:Anosmia", "dbr:Shortness_of_breath"],
    ),
    (
        "dbr:Measles",
        "Measles",
        &["dbr:Fever", "dbr:Rash", "dbr:Cough", "dbr:Conjunctivitis", "dbr:Rhinorrhea"],
    ),
    (
        "dbr:Chickenpox",
        "Chickenpox",
        &["dbr:Fever", "dbr:Rash", "dbr:Fatigue", "dbr:Headache"],
    ),
    (
        "dbr:Migraine",
        "Migraine",
        &["dbr:Headache", "dbr:Nausea", "dbr:Photophobia"],
    ),
    (
        "dbr:Gastroenteritis",
        "Gastroenteritis",
        &["dbr:Diarrhea", "dbr:Nausea", "dbr:Vomiting", "dbr:Fever", "dbr:Abdominal_pain"],
    ),
];

const LABELS: &[(&str, &str)] = &[
    ("dbr:Myalgia", "Muscle pain"),
    ("dbr:Rhinorrhea", "Runny nose"),
    ("dbr:Sneeze", "Sneezing"),
    ("dbr:Anosmia", "Loss of smell"),
    ("dbr:Photophobia", "Sensitivity to light"),
];

/// Wikipedia page ids and the symptom text of their demo articles.
const ARTICLES: &[(&str, &str, &str)] = &[
    (
        "dbr:Influenza",
        "15071",
        "Symptoms begin suddenly with fever, muscle pain, headache and a dry cough.\n\
         Fatigue may last for weeks.",
    ),
    (
        "dbr:Common_cold",
        "6339",
        "A runny nose, sneezing and a sore throat are typical. Fever is uncommon in adults.",
    ),
    (
        "dbr:COVID-19",
        "63030231",
        "Fever, cough, fatigue and loss of smell are common. Shortness of breath needs medical attention.",
    ),
    (
        "dbr:Measles",
        "19889",
        "High fever, cough, runny nose and red eyes, followed by a spreading rash.",
    ),
    (
        "dbr:Chickenpox",
        "7197",
        "An itchy blister-like rash appears first on the chest and face, with fever and tiredness.",
    ),
];

pub fn graph() -> InMemoryGraph {
    let mut graph = InMemoryGraph::new();
    for (id, label, symptoms) in DISEASES {
        graph = graph.with_disease(id, label, symptoms);
    }
    for (id, label) in LABELS {
        graph = graph.with_symptom_label(id, label);
    }
    for (disease, page, _) in ARTICLES {
        graph = graph.with_reference(disease, ReferenceId::new(ReferenceSource::Wikipedia, *page));
    }
    // Known to the graph but missing from the library
    graph.with_reference(
        "dbr:Gastroenteritis",
        ReferenceId::new(ReferenceSource::Wikipedia, "1"),
    )
}

pub fn library() -> InMemoryLibrary {
    let mut library = InMemoryLibrary::new();
    for (disease, page, text) in ARTICLES {
        let title = disease.trim_start_matches("dbr:").replace('_', " ");
        library = library.with_article(
            ReferenceId::new(ReferenceSource::Wikipedia, *page),
            Article {
                full_text: format!("{} is an illness.\n{}", title, text),
                title,
                symptoms_section: Some(text.to_string()),
            },
        );
    }
    library
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use symcheck_common::{KnowledgeGraph, ReferenceLibrary, SymptomId};

    #[test]
    fn test_demo_graph_is_consistent() {
        let graph = graph();
        let labels = graph.all_symptoms().unwrap();
        assert_eq!(labels.label_of(&SymptomId::new("dbr:Myalgia")), Some("Muscle pain"));

        let fever: BTreeSet<SymptomId> = [SymptomId::new("dbr:Fever")].into_iter().collect();
        assert_eq!(graph.diseases_with_symptoms(&fever).unwrap().len(), 5);
    }

    #[test]
    fn test_demo_library_articles() {
        let library = library();
        let flu = ReferenceId::new(ReferenceSource::Wikipedia, "15071");
        let article = library.fetch(&flu).unwrap().unwrap();
        assert_eq!(article.title, "Influenza");
        assert!(library
            .fetch(&ReferenceId::new(ReferenceSource::Wikipedia, "1"))
            .unwrap()
            .is_none());
    }
}
