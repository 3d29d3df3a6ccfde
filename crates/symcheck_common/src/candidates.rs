//! Candidate Resolver
//!
//! Turns the confirmed symptoms into the set of diseases still consistent
//! with them, each with its full symptom profile. Profiles live for one
//! resolution cycle only; every evidence change triggers a fresh resolve.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::evidence::EvidenceSnapshot;
use crate::graph::KnowledgeGraph;
use crate::ids::{DiseaseId, DiseaseRef, SymptomId};
use crate::retry::RetryPolicy;

/// How an excluded symptom affects a disease that lists it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionPolicy {
    /// The disease is no longer consistent with the evidence and is dropped
    #[default]
    Eliminate,
    /// The disease stays; the symptom is only removed from its profile
    FilterOnly,
}

impl ExclusionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionPolicy::Eliminate => "eliminate",
            ExclusionPolicy::FilterOnly => "filter_only",
        }
    }
}

impl std::str::FromStr for ExclusionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "eliminate" => Ok(ExclusionPolicy::Eliminate),
            "filter_only" | "filter" => Ok(ExclusionPolicy::FilterOnly),
            other => Err(format!("unknown exclusion policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub disease: DiseaseRef,
    pub profile: BTreeSet<SymptomId>,
}

impl Candidate {
    pub fn id(&self) -> &DiseaseId {
        &self.disease.id
    }

    /// Profile with `excluded` removed.
    pub fn filtered(&self, excluded: &BTreeSet<SymptomId>) -> BTreeSet<SymptomId> {
        self.profile.difference(excluded).cloned().collect()
    }
}

/// Diseases consistent with the confirmed symptoms, ordered by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    /// Build a set. Duplicate identifiers keep the first entry after
    /// sorting by identifier and label.
    pub fn new(mut candidates: Vec<Candidate>) -> Self {
        candidates.sort_by(|a, b| a.disease.cmp(&b.disease));
        candidates.dedup_by(|later, first| later.disease.id == first.disease.id);
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    pub fn get(&self, id: &DiseaseId) -> Option<&Candidate> {
        self.candidates
            .binary_search_by(|c| c.id().cmp(id))
            .ok()
            .map(|i| &self.candidates[i])
    }

    pub fn diseases(&self) -> impl Iterator<Item = &DiseaseRef> {
        self.candidates.iter().map(|c| &c.disease)
    }

    /// Working set for the given evidence: excluded symptoms are removed
    /// from every profile, and under `Eliminate` any disease that listed
    /// one is dropped first.
    pub fn narrow(&self, evidence: &EvidenceSnapshot, policy: ExclusionPolicy) -> CandidateSet {
        let excluded = &evidence.excluded;
        let candidates = self
            .candidates
            .iter()
            .filter(|c| match policy {
                ExclusionPolicy::Eliminate => c.profile.is_disjoint(excluded),
                ExclusionPolicy::FilterOnly => true,
            })
            .map(|c| Candidate {
                disease: c.disease.clone(),
                profile: c.filtered(excluded),
            })
            .collect();
        CandidateSet { candidates }
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

pub struct CandidateResolver<'a> {
    graph: &'a dyn KnowledgeGraph,
    retry: RetryPolicy,
}

impl<'a> CandidateResolver<'a> {
    pub fn new(graph: &'a dyn KnowledgeGraph, retry: RetryPolicy) -> Self {
        Self { graph, retry }
    }

    /// Every disease whose profile contains all of `confirmed`, with full
    /// profiles. Both graph calls run under the retry policy; an empty
    /// result is a success.
    pub fn resolve(&self, confirmed: &BTreeSet<SymptomId>) -> Result<CandidateSet> {
        let diseases = self
            .retry
            .run("diseases_with_symptoms", || self.graph.diseases_with_symptoms(confirmed))?;

        if diseases.is_empty() {
            debug!("resolve: no disease matches {} confirmed symptoms", confirmed.len());
            return Ok(CandidateSet::default());
        }

        let ids: Vec<DiseaseId> = diseases
            .iter()
            .map(|d| d.id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let profiles: BTreeMap<DiseaseId, BTreeSet<SymptomId>> = self
            .retry
            .run("disease_profiles", || self.graph.disease_profiles(&ids))?;

        let candidates = diseases
            .into_iter()
            .map(|disease| {
                let profile = profiles.get(&disease.id).cloned().unwrap_or_else(|| {
                    debug!("resolve: no profile returned for {}", disease.id);
                    BTreeSet::new()
                });
                Candidate { disease, profile }
            })
            .collect();

        let set = CandidateSet::new(candidates);
        debug!("resolve: {} candidates", set.len());
        Ok(set)
    }
}
