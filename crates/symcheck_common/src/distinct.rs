//! Distinctness Check
//!
//! Two candidates can only be told apart by a question if their filtered
//! profiles differ. Recomputed after every evidence change.

use std::collections::{BTreeMap, BTreeSet};

use crate::candidates::CandidateSet;
use crate::ids::{DiseaseId, SymptomId};

/// Equivalence classes of candidates with set-equal filtered profiles.
/// Members are sorted by identifier; classes are ordered by first member.
pub fn distinct_groups(
    candidates: &CandidateSet,
    excluded: &BTreeSet<SymptomId>,
) -> Vec<Vec<DiseaseId>> {
    let mut classes: BTreeMap<BTreeSet<SymptomId>, Vec<DiseaseId>> = BTreeMap::new();
    for candidate in candidates {
        classes
            .entry(candidate.filtered(excluded))
            .or_default()
            .push(candidate.id().clone());
    }
    let mut groups: Vec<Vec<DiseaseId>> = classes.into_values().collect();
    groups.sort();
    groups
}

/// Number of distinguishable classes. At most one means no further
/// question can change the outcome.
pub fn remaining_distinct_groups(candidates: &CandidateSet, excluded: &BTreeSet<SymptomId>) -> usize {
    distinct_groups(candidates, excluded).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::Candidate;
    use crate::ids::DiseaseRef;

    fn set(entries: &[(&str, &[&str])]) -> CandidateSet {
        CandidateSet::new(
            entries
                .iter()
                .map(|(id, profile)| Candidate {
                    disease: DiseaseRef::new(*id, *id),
                    profile: profile.iter().map(SymptomId::new).collect(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_identical_profiles_form_one_group() {
        let candidates = set(&[
            ("dbr:A", &["dbr:Fever", "dbr:Cough"]),
            ("dbr:B", &["dbr:Cough", "dbr:Fever"]),
        ]);
        assert_eq!(remaining_distinct_groups(&candidates, &BTreeSet::new()), 1);
    }

    #[test]
    fn test_pairwise_distinct_profiles() {
        let candidates = set(&[
            ("dbr:A", &["dbr:Fever"]),
            ("dbr:B", &["dbr:Rash"]),
            ("dbr:C", &["dbr:Cough"]),
        ]);
        assert_eq!(remaining_distinct_groups(&candidates, &BTreeSet::new()), 3);
    }

    #[test]
    fn test_exclusion_merges_groups() {
        let candidates = set(&[
            ("dbr:C", &["dbr:Fever", "dbr:Cough"]),
            ("dbr:A", &["dbr:Fever", "dbr:Cough"]),
            ("dbr:B", &["dbr:Fever", "dbr:Rash"]),
        ]);
        let groups = distinct_groups(&candidates, &BTreeSet::new());
        assert_eq!(
            groups,
            vec![
                vec![DiseaseId::new("dbr:A"), DiseaseId::new("dbr:C")],
                vec![DiseaseId::new("dbr:B")],
            ]
        );

        let excluded: BTreeSet<SymptomId> =
            ["dbr:Cough", "dbr:Rash"].iter().map(SymptomId::new).collect();
        assert_eq!(remaining_distinct_groups(&candidates, &excluded), 1);
    }

    #[test]
    fn test_empty_set_has_no_groups() {
        assert_eq!(remaining_distinct_groups(&CandidateSet::default(), &BTreeSet::new()), 0);
    }
}
