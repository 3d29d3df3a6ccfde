//! In-memory collaborators
//!
//! Deterministic `KnowledgeGraph` and `ReferenceLibrary` implementations
//! backed by plain maps. Used by tests and by the offline demo. The graph
//! can be told to fail its next N calls to exercise the retry path.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};

use crate::graph::{GraphError, KnowledgeGraph};
use crate::ids::{DiseaseId, DiseaseRef, SymptomId};
use crate::labels::LabelMap;
use crate::reference::{Article, ReferenceError, ReferenceId, ReferenceLibrary, ReferenceSource};

#[derive(Debug, Clone)]
struct DiseaseEntry {
    label: String,
    profile: BTreeSet<SymptomId>,
}

#[derive(Debug, Default)]
pub struct InMemoryGraph {
    symptom_labels: BTreeMap<SymptomId, String>,
    diseases: BTreeMap<DiseaseId, DiseaseEntry>,
    references: HashMap<(DiseaseId, ReferenceSource), ReferenceId>,
    pending_failures: Mutex<u32>,
    calls: Mutex<usize>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a disease with its symptom profile.
    pub fn with_disease(mut self, id: &str, label: &str, symptoms: &[&str]) -> Self {
        self.diseases.insert(
            DiseaseId::new(id),
            DiseaseEntry {
                label: label.to_string(),
                profile: symptoms.iter().map(SymptomId::new).collect(),
            },
        );
        self
    }

    /// Give a symptom a label. Unlabelled symptoms use their local name.
    pub fn with_symptom_label(mut self, id: &str, label: &str) -> Self {
        self.symptom_labels.insert(SymptomId::new(id), label.to_string());
        self
    }

    pub fn with_reference(mut self, disease: &str, reference: ReferenceId) -> Self {
        self.references
            .insert((DiseaseId::new(disease), reference.source), reference);
        self
    }

    /// Make the next `count` calls fail with a transport error.
    pub fn fail_next(&self, count: u32) {
        *self
            .pending_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = count;
    }

    /// Number of calls made so far, failed ones included.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) -> Result<(), GraphError> {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        let mut pending = self
            .pending_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *pending > 0 {
            *pending -= 1;
            return Err(GraphError::Transport("injected failure".to_string()));
        }
        Ok(())
    }

    fn label_map<'a, I>(&self, symptoms: I) -> LabelMap<SymptomId>
    where
        I: IntoIterator<Item = &'a SymptomId>,
    {
        let pairs = symptoms.into_iter().map(|s| {
            let label = self
                .symptom_labels
                .get(s)
                .cloned()
                .unwrap_or_else(|| s.local_name());
            (label, s.clone())
        });
        let (map, _conflicts) = LabelMap::from_pairs(pairs);
        map
    }

    fn matching(&self, wanted: &BTreeSet<SymptomId>) -> impl Iterator<Item = (&DiseaseId, &DiseaseEntry)> {
        let wanted = wanted.clone();
        self.diseases
            .iter()
            .filter(move |(_, e)| !e.profile.is_empty() && wanted.is_subset(&e.profile))
    }
}

impl KnowledgeGraph for InMemoryGraph {
    fn all_symptoms(&self) -> Result<LabelMap<SymptomId>, GraphError> {
        self.enter()?;
        let all: BTreeSet<&SymptomId> = self.diseases.values().flat_map(|e| &e.profile).collect();
        Ok(self.label_map(all))
    }

    fn co_occurring_symptoms(
        &self,
        confirmed: &BTreeSet<SymptomId>,
    ) -> Result<LabelMap<SymptomId>, GraphError> {
        self.enter()?;
        let all: BTreeSet<&SymptomId> = self
            .matching(confirmed)
            .flat_map(|(_, e)| &e.profile)
            .collect();
        Ok(self.label_map(all))
    }

    fn diseases_with_symptoms(
        &self,
        symptoms: &BTreeSet<SymptomId>,
    ) -> Result<Vec<DiseaseRef>, GraphError> {
        self.enter()?;
        Ok(self
            .matching(symptoms)
            .map(|(id, e)| DiseaseRef::new(id.clone(), e.label.clone()))
            .collect())
    }

    fn symptoms_of_disease(
        &self,
        disease: &DiseaseId,
        exclude: &BTreeSet<SymptomId>,
    ) -> Result<BTreeSet<SymptomId>, GraphError> {
        self.enter()?;
        Ok(self
            .diseases
            .get(disease)
            .map(|e| e.profile.difference(exclude).cloned().collect())
            .unwrap_or_default())
    }

    fn reference_of(
        &self,
        disease: &DiseaseId,
        source: ReferenceSource,
    ) -> Result<Option<ReferenceId>, GraphError> {
        self.enter()?;
        Ok(self.references.get(&(disease.clone(), source)).cloned())
    }
}

/// Article store keyed by reference id.
#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    articles: HashMap<ReferenceId, Article>,
    broken: HashMap<ReferenceId, String>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_article(mut self, reference: ReferenceId, article: Article) -> Self {
        self.articles.insert(reference, article);
        self
    }

    /// Fetching `reference` fails with a network error.
    pub fn with_broken(mut self, reference: ReferenceId, reason: &str) -> Self {
        self.broken.insert(reference, reason.to_string());
        self
    }
}

impl ReferenceLibrary for InMemoryLibrary {
    fn fetch(&self, reference: &ReferenceId) -> Result<Option<Article>, ReferenceError> {
        if let Some(reason) = self.broken.get(reference) {
            return Err(ReferenceError::Network(reason.clone()));
        }
        Ok(self.articles.get(reference).cloned())
    }
}
