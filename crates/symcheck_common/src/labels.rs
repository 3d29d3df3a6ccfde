//! Bidirectional label <-> identifier mapping.
//!
//! One map answers both directions; a label and an identifier are bound to
//! at most one partner each.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Rejected insertion: one side was already bound to a different partner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("label '{label}' conflicts with existing binding to '{existing}' (rejected '{rejected}')")]
pub struct LabelConflict {
    pub label: String,
    pub existing: String,
    pub rejected: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMap<Id: Ord> {
    by_label: BTreeMap<String, Id>,
    by_id: BTreeMap<Id, String>,
}

impl<Id: Ord> Default for LabelMap<Id> {
    fn default() -> Self {
        Self {
            by_label: BTreeMap::new(),
            by_id: BTreeMap::new(),
        }
    }
}

impl<Id> LabelMap<Id>
where
    Id: Ord + Clone + std::fmt::Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `label` to `id`. Re-binding the same pair is a no-op.
    pub fn insert(&mut self, label: impl Into<String>, id: Id) -> Result<(), LabelConflict> {
        let label = label.into();

        if let Some(existing) = self.by_label.get(&label) {
            if *existing == id {
                return Ok(());
            }
            return Err(LabelConflict {
                label,
                existing: existing.to_string(),
                rejected: id.to_string(),
            });
        }

        if let Some(existing_label) = self.by_id.get(&id) {
            return Err(LabelConflict {
                label,
                existing: existing_label.clone(),
                rejected: id.to_string(),
            });
        }

        self.by_label.insert(label.clone(), id.clone());
        self.by_id.insert(id, label);
        Ok(())
    }

    /// Build a map from unordered pairs. Pairs are applied by identifier
    /// ascending and the first binding wins, so the result does not depend
    /// on input order. Rejected pairs are returned for logging.
    pub fn from_pairs<I>(pairs: I) -> (Self, Vec<LabelConflict>)
    where
        I: IntoIterator<Item = (String, Id)>,
    {
        let mut pairs: Vec<(String, Id)> = pairs.into_iter().collect();
        pairs.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let mut map = Self::new();
        let mut conflicts = Vec::new();
        for (label, id) in pairs {
            if let Err(conflict) = map.insert(label, id) {
                conflicts.push(conflict);
            }
        }
        (map, conflicts)
    }

    pub fn id_of(&self, label: &str) -> Option<&Id> {
        self.by_label.get(label)
    }

    pub fn label_of(&self, id: &Id) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    pub fn contains_id(&self, id: &Id) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Labels in alphabetical order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.by_label.keys().map(String::as_str)
    }

    /// `(label, id)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Id)> {
        self.by_label.iter().map(|(l, id)| (l.as_str(), id))
    }

    /// Case-insensitive substring search over labels, in label order.
    pub fn search(&self, fragment: &str) -> Vec<(&str, &Id)> {
        let needle = fragment.trim().to_lowercase();
        self.iter()
            .filter(|(label, _)| needle.is_empty() || label.to_lowercase().contains(&needle))
            .collect()
    }

    /// Resolve a label typed by a user: exact match first, then a unique
    /// case-insensitive match.
    pub fn resolve_label(&self, input: &str) -> Option<&Id> {
        let input = input.trim();
        if let Some(id) = self.by_label.get(input) {
            return Some(id);
        }
        let lowered = input.to_lowercase();
        let mut matches = self
            .by_label
            .iter()
            .filter(|(label, _)| label.to_lowercase() == lowered);
        match (matches.next(), matches.next()) {
            (Some((_, id)), None) => Some(id),
            _ => None,
        }
    }

    /// Keep only identifiers accepted by `keep`.
    pub fn retain_ids<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&Id) -> bool,
    {
        let mut out = Self::new();
        for (id, label) in &self.by_id {
            if keep(id) {
                out.by_label.insert(label.clone(), id.clone());
                out.by_id.insert(id.clone(), label.clone());
            }
        }
        out
    }
}

impl LabelMap<crate::ids::SymptomId> {
    /// Label for display, falling back to the identifier's local name.
    pub fn label_or_fallback(&self, id: &crate::ids::SymptomId) -> String {
        self.label_of(id)
            .map(str::to_string)
            .unwrap_or_else(|| id.local_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SymptomId;

    fn sid(s: &str) -> SymptomId {
        SymptomId::new(s)
    }

    #[test]
    fn test_insert_and_lookup_both_directions() {
        let mut map = LabelMap::new();
        map.insert("Fever", sid("dbr:Fever")).unwrap();
        assert_eq!(map.id_of("Fever"), Some(&sid("dbr:Fever")));
        assert_eq!(map.label_of(&sid("dbr:Fever")), Some("Fever"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_same_pair_is_idempotent() {
        let mut map = LabelMap::new();
        map.insert("Fever", sid("dbr:Fever")).unwrap();
        assert!(map.insert("Fever", sid("dbr:Fever")).is_ok());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_conflicts_rejected_on_either_side() {
        let mut map = LabelMap::new();
        map.insert("Fever", sid("dbr:Fever")).unwrap();

        let err = map.insert("Fever", sid("dbr:Pyrexia")).unwrap_err();
        assert_eq!(err.existing, "dbr:Fever");

        let err = map.insert("High temperature", sid("dbr:Fever")).unwrap_err();
        assert_eq!(err.existing, "Fever");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_from_pairs_is_order_independent() {
        let forward = vec![
            ("Fever".to_string(), sid("dbr:Pyrexia")),
            ("Fever".to_string(), sid("dbr:Fever")),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        let (a, conflicts_a) = LabelMap::from_pairs(forward);
        let (b, conflicts_b) = LabelMap::from_pairs(backward);
        assert_eq!(a, b);
        assert_eq!(a.id_of("Fever"), Some(&sid("dbr:Fever")));
        assert_eq!(conflicts_a.len(), 1);
        assert_eq!(conflicts_b.len(), 1);
    }

    #[test]
    fn test_search_and_resolve() {
        let (map, _) = LabelMap::from_pairs(vec![
            ("Headache".to_string(), sid("dbr:Headache")),
            ("Head injury".to_string(), sid("dbr:Head_injury")),
            ("Cough".to_string(), sid("dbr:Cough")),
        ]);
        let hits: Vec<&str> = map.search("HEAD").into_iter().map(|(l, _)| l).collect();
        assert_eq!(hits, vec!["Head injury", "Headache"]);
        assert_eq!(map.resolve_label("cough"), Some(&sid("dbr:Cough")));
        assert_eq!(map.resolve_label("sneeze"), None);
    }

    #[test]
    fn test_fallback_label() {
        let map: LabelMap<SymptomId> = LabelMap::new();
        assert_eq!(map.label_or_fallback(&sid("dbr:Night_sweats")), "Night sweats");
    }
}
