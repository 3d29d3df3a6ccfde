//! Knowledge-graph collaborator interface.
//!
//! Implementations issue pattern queries over a disease/symptom ontology.
//! Every call may fail transiently; the engine wraps all of them in a
//! [`RetryPolicy`](crate::retry::RetryPolicy).

use std::collections::{BTreeMap, BTreeSet};

use crate::ids::{DiseaseId, DiseaseRef, SymptomId};
use crate::labels::LabelMap;
use crate::reference::{ReferenceId, ReferenceSource};

/// Knowledge graph errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Endpoint returned HTTP {0}")]
    Status(u16),

    #[error("Could not decode response: {0}")]
    Decode(String),
}

pub trait KnowledgeGraph {
    /// Every symptom linked to at least one disease.
    fn all_symptoms(&self) -> Result<LabelMap<SymptomId>, GraphError>;

    /// Symptoms of every disease exhibiting all of `confirmed`.
    /// With nothing confirmed this is the full symptom list.
    fn co_occurring_symptoms(
        &self,
        confirmed: &BTreeSet<SymptomId>,
    ) -> Result<LabelMap<SymptomId>, GraphError>;

    /// Diseases whose profile is a superset of `symptoms`. An empty set
    /// selects every disease with at least one symptom link.
    fn diseases_with_symptoms(
        &self,
        symptoms: &BTreeSet<SymptomId>,
    ) -> Result<Vec<DiseaseRef>, GraphError>;

    /// Profile of one disease, minus anything in `exclude`.
    fn symptoms_of_disease(
        &self,
        disease: &DiseaseId,
        exclude: &BTreeSet<SymptomId>,
    ) -> Result<BTreeSet<SymptomId>, GraphError>;

    /// Profiles of several diseases. Backends able to batch should override.
    fn disease_profiles(
        &self,
        diseases: &[DiseaseId],
    ) -> Result<BTreeMap<DiseaseId, BTreeSet<SymptomId>>, GraphError> {
        let none = BTreeSet::new();
        diseases
            .iter()
            .map(|d| Ok((d.clone(), self.symptoms_of_disease(d, &none)?)))
            .collect()
    }

    /// External reference identifier of a disease; `Ok(None)` when the
    /// graph has none for the requested source.
    fn reference_of(
        &self,
        disease: &DiseaseId,
        source: ReferenceSource,
    ) -> Result<Option<ReferenceId>, GraphError>;
}

impl<T: KnowledgeGraph + ?Sized> KnowledgeGraph for &T {
    fn all_symptoms(&self) -> Result<LabelMap<SymptomId>, GraphError> {
        (**self).all_symptoms()
    }

    fn co_occurring_symptoms(
        &self,
        confirmed: &BTreeSet<SymptomId>,
    ) -> Result<LabelMap<SymptomId>, GraphError> {
        (**self).co_occurring_symptoms(confirmed)
    }

    fn diseases_with_symptoms(
        &self,
        symptoms: &BTreeSet<SymptomId>,
    ) -> Result<Vec<DiseaseRef>, GraphError> {
        (**self).diseases_with_symptoms(symptoms)
    }

    fn symptoms_of_disease(
        &self,
        disease: &DiseaseId,
        exclude: &BTreeSet<SymptomId>,
    ) -> Result<BTreeSet<SymptomId>, GraphError> {
        (**self).symptoms_of_disease(disease, exclude)
    }

    fn disease_profiles(
        &self,
        diseases: &[DiseaseId],
    ) -> Result<BTreeMap<DiseaseId, BTreeSet<SymptomId>>, GraphError> {
        (**self).disease_profiles(diseases)
    }

    fn reference_of(
        &self,
        disease: &DiseaseId,
        source: ReferenceSource,
    ) -> Result<Option<ReferenceId>, GraphError> {
        (**self).reference_of(disease, source)
    }
}
