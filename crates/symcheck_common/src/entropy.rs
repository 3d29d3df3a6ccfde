//! Entropy Engine
//!
//! Scores every open symptom by the binary Shannon entropy of its
//! presence across the remaining candidates. A symptom present in half of
//! them splits the set best and scores 1.0; one present in none or all of
//! them cannot split anything and scores exactly 0.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::candidates::CandidateSet;
use crate::evidence::EvidenceSnapshot;
use crate::ids::SymptomId;

/// Entropy of a symptom present in `count` of `n` candidates.
pub fn binary_entropy(count: usize, n: usize) -> f64 {
    if n == 0 || count == 0 || count >= n {
        return 0.0;
    }
    // H(k/n) == H((n-k)/n) must hold bit for bit, or ties break on rounding.
    let k = count.min(n - count);
    let p = k as f64 / n as f64;
    let q = 1.0 - p;
    -(p * p.log2() + q * q.log2())
}

/// Per-symptom scores for every symptom in at least one filtered profile.
pub fn entropy_table(
    candidates: &CandidateSet,
    excluded: &BTreeSet<SymptomId>,
) -> BTreeMap<SymptomId, f64> {
    let n = candidates.len();
    let mut counts: BTreeMap<SymptomId, usize> = BTreeMap::new();
    for candidate in candidates {
        for symptom in candidate.profile.difference(excluded) {
            *counts.entry(symptom.clone()).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|(symptom, count)| (symptom, binary_entropy(count, n)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSymptom {
    pub symptom: SymptomId,
    pub score: f64,
}

impl RankedSymptom {
    /// Zero-score symptoms cannot change the candidate set.
    pub fn is_informative(&self) -> bool {
        self.score > 0.0
    }
}

/// Open symptoms ordered by score descending, then identifier ascending.
/// Symptoms with any answer are left out; no candidates means no ranking.
pub fn rank(candidates: &CandidateSet, evidence: &EvidenceSnapshot) -> Vec<RankedSymptom> {
    if candidates.is_empty() {
        return Vec::new();
    }
    let mut ranked: Vec<RankedSymptom> = entropy_table(candidates, &evidence.excluded)
        .into_iter()
        .filter(|(symptom, _)| !evidence.is_answered(symptom))
        .map(|(symptom, score)| RankedSymptom { symptom, score })
        .collect();
    ranked.sort_by(compare);
    ranked
}

fn compare(a: &RankedSymptom, b: &RankedSymptom) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.symptom.cmp(&b.symptom))
}
