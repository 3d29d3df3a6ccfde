//! SPARQL Knowledge Graph - DBpedia client
//!
//! Runs pattern queries over `dbo:symptom` links and decodes the standard
//! SPARQL JSON results format. Resource identifiers come back as full URIs
//! and are compacted to `dbr:` form by the identifier types.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, warn};

use symcheck_common::config::GraphConfig;
use symcheck_common::{
    DiseaseId, DiseaseRef, GraphError, KnowledgeGraph, LabelMap, ReferenceId, ReferenceSource,
    SymptomId,
};

const RESULTS_FORMAT: &str = "application/sparql-results+json";

const PREFIXES: &str = "PREFIX dbo: <http://dbpedia.org/ontology/>\n\
                        PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n";

/// Diseases per `VALUES` block when fetching profiles in bulk
const PROFILE_BATCH: usize = 50;

// ============================================================================
// Result decoding
// ============================================================================

#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: ResultSet,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    bindings: Vec<Binding>,
}

/// One solution row: variable name to bound term
pub type Binding = HashMap<String, Term>;

#[derive(Debug, Clone, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Term {
    fn is_resource(&self) -> bool {
        self.kind == "uri"
    }
}

pub fn parse_bindings(body: &str) -> Result<Vec<Binding>, GraphError> {
    let parsed: SparqlResults =
        serde_json::from_str(body).map_err(|e| GraphError::Decode(e.to_string()))?;
    Ok(parsed.results.bindings)
}

fn resource<'b>(row: &'b Binding, var: &str) -> Option<&'b str> {
    row.get(var).filter(|t| t.is_resource()).map(|t| t.value.as_str())
}

fn literal<'b>(row: &'b Binding, var: &str) -> Option<&'b str> {
    row.get(var).map(|t| t.value.as_str()).filter(|v| !v.trim().is_empty())
}

/// `?symptom ?label` rows to a label map. Unlabelled symptoms get their
/// local name; conflicting labels are logged and dropped.
pub fn symptom_labels(rows: &[Binding]) -> LabelMap<SymptomId> {
    let pairs = rows.iter().filter_map(|row| {
        let id = SymptomId::new(resource(row, "symptom")?);
        let label = match literal(row, "label") {
            Some(label) => label.trim().to_string(),
            None => id.local_name(),
        };
        Some((label, id))
    });
    let (labels, conflicts) = LabelMap::from_pairs(pairs);
    for conflict in conflicts {
        warn!("Skipping symptom label: {}", conflict);
    }
    labels
}

/// `?disease ?label` rows to disease references, one per identifier.
pub fn disease_refs(rows: &[Binding]) -> Vec<DiseaseRef> {
    // Smallest English label wins, whatever the row order; unlabelled rows
    // only reserve the identifier.
    let mut found: BTreeMap<DiseaseId, Option<String>> = BTreeMap::new();
    for row in rows {
        let Some(uri) = resource(row, "disease") else {
            continue;
        };
        let slot = found.entry(DiseaseId::new(uri)).or_default();
        let Some(label) = literal(row, "label").map(|l| l.trim().to_string()) else {
            continue;
        };
        if slot.as_deref().map_or(true, |current| label.as_str() < current) {
            *slot = Some(label);
        }
    }
    found
        .into_iter()
        .map(|(id, label)| {
            let label = label.unwrap_or_else(|| id.local_name());
            DiseaseRef { id, label }
        })
        .collect()
}

/// `?disease ?symptom` rows to per-disease profiles.
pub fn profiles(rows: &[Binding]) -> BTreeMap<DiseaseId, BTreeSet<SymptomId>> {
    let mut out: BTreeMap<DiseaseId, BTreeSet<SymptomId>> = BTreeMap::new();
    for row in rows {
        if let (Some(d), Some(s)) = (resource(row, "disease"), resource(row, "symptom")) {
            out.entry(DiseaseId::new(d)).or_default().insert(SymptomId::new(s));
        }
    }
    out
}

/// `?symptom` rows to a set of symptom identifiers.
pub fn symptom_set(rows: &[Binding]) -> BTreeSet<SymptomId> {
    rows.iter()
        .filter_map(|row| resource(row, "symptom"))
        .map(SymptomId::new)
        .collect()
}

/// First `?ref` value, whether literal (page id) or resource.
pub fn reference_key(rows: &[Binding]) -> Option<String> {
    rows.iter()
        .filter_map(|row| row.get("ref"))
        .map(|t| t.value.trim().to_string())
        .find(|v| !v.is_empty())
}

// ============================================================================
// Query builders
// ============================================================================

fn iri(uri: String) -> String {
    format!("<{}>", uri)
}

const LABEL_PATTERN: &str =
    "OPTIONAL { ?symptom rdfs:label ?label . FILTER(langMatches(lang(?label), \"en\")) }";

const DISEASE_LABEL_PATTERN: &str =
    "OPTIONAL { ?disease rdfs:label ?label . FILTER(langMatches(lang(?label), \"en\")) }";

pub fn all_symptoms_query() -> String {
    format!(
        "{}SELECT DISTINCT ?symptom ?label WHERE {{\n  ?disease dbo:symptom ?symptom .\n  {}\n}}",
        PREFIXES, LABEL_PATTERN
    )
}

pub fn co_occurring_query(confirmed: &BTreeSet<SymptomId>) -> String {
    if confirmed.is_empty() {
        return all_symptoms_query();
    }
    let values: Vec<String> = confirmed.iter().map(|s| iri(s.expand())).collect();
    format!(
        "{}SELECT DISTINCT ?symptom ?label WHERE {{\n  {{\n    SELECT ?disease WHERE {{\n      \
         VALUES ?input {{ {} }}\n      ?disease dbo:symptom ?input .\n    }}\n    \
         GROUP BY ?disease\n    HAVING (COUNT(DISTINCT ?input) = {})\n  }}\n  \
         ?disease dbo:symptom ?symptom .\n  {}\n}}",
        PREFIXES,
        values.join(" "),
        confirmed.len(),
        LABEL_PATTERN
    )
}

pub fn diseases_query(symptoms: &BTreeSet<SymptomId>) -> String {
    let mut patterns = String::new();
    if symptoms.is_empty() {
        patterns.push_str("  ?disease dbo:symptom ?any .\n");
    }
    for symptom in symptoms {
        patterns.push_str(&format!("  ?disease dbo:symptom+ {} .\n", iri(symptom.expand())));
    }
    format!(
        "{}SELECT DISTINCT ?disease ?label WHERE {{\n{}  {}\n}}",
        PREFIXES, patterns, DISEASE_LABEL_PATTERN
    )
}

pub fn disease_symptoms_query(disease: &DiseaseId) -> String {
    format!(
        "{}SELECT DISTINCT ?symptom WHERE {{\n  {} dbo:symptom+ ?symptom .\n}}",
        PREFIXES,
        iri(disease.expand())
    )
}

pub fn profiles_query(diseases: &[DiseaseId]) -> String {
    let values: Vec<String> = diseases.iter().map(|d| iri(d.expand())).collect();
    format!(
        "{}SELECT DISTINCT ?disease ?symptom WHERE {{\n  VALUES ?disease {{ {} }}\n  \
         ?disease dbo:symptom+ ?symptom .\n}}",
        PREFIXES,
        values.join(" ")
    )
}

pub fn reference_query(disease: &DiseaseId, source: ReferenceSource) -> String {
    let property = match source {
        ReferenceSource::Wikipedia => "dbo:wikiPageID",
        ReferenceSource::MedlinePlus => "dbo:medlinePlus",
    };
    format!(
        "{}SELECT ?ref WHERE {{\n  {} {} ?ref .\n}} LIMIT 1",
        PREFIXES,
        iri(disease.expand()),
        property
    )
}

// ============================================================================
// Client
// ============================================================================

/// Knowledge graph backed by a SPARQL endpoint
pub struct DbpediaGraph {
    client: Client,
    endpoint: String,
}

impl DbpediaGraph {
    pub fn new(config: &GraphConfig) -> Result<Self, GraphError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GraphError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn select(&self, query: &str) -> Result<Vec<Binding>, GraphError> {
        debug!("SPARQL query:\n{}", query);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query), ("format", RESULTS_FORMAT)])
            .header(ACCEPT, RESULTS_FORMAT)
            .send()
            .map_err(|e| GraphError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GraphError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| GraphError::Transport(e.to_string()))?;
        let rows = parse_bindings(&body)?;
        debug!("SPARQL returned {} rows", rows.len());
        Ok(rows)
    }
}

impl KnowledgeGraph for DbpediaGraph {
    fn all_symptoms(&self) -> Result<LabelMap<SymptomId>, GraphError> {
        Ok(symptom_labels(&self.select(&all_symptoms_query())?))
    }

    fn co_occurring_symptoms(
        &self,
        confirmed: &BTreeSet<SymptomId>,
    ) -> Result<LabelMap<SymptomId>, GraphError> {
        Ok(symptom_labels(&self.select(&co_occurring_query(confirmed))?))
    }

    fn diseases_with_symptoms(
        &self,
        symptoms: &BTreeSet<SymptomId>,
    ) -> Result<Vec<DiseaseRef>, GraphError> {
        Ok(disease_refs(&self.select(&diseases_query(symptoms))?))
    }

    fn symptoms_of_disease(
        &self,
        disease: &DiseaseId,
        exclude: &BTreeSet<SymptomId>,
    ) -> Result<BTreeSet<SymptomId>, GraphError> {
        let mut symptoms = symptom_set(&self.select(&disease_symptoms_query(disease))?);
        symptoms.retain(|s| !exclude.contains(s));
        Ok(symptoms)
    }

    fn disease_profiles(
        &self,
        diseases: &[DiseaseId],
    ) -> Result<BTreeMap<DiseaseId, BTreeSet<SymptomId>>, GraphError> {
        let mut all = BTreeMap::new();
        for chunk in diseases.chunks(PROFILE_BATCH) {
            all.extend(profiles(&self.select(&profiles_query(chunk))?));
        }
        Ok(all)
    }

    fn reference_of(
        &self,
        disease: &DiseaseId,
        source: ReferenceSource,
    ) -> Result<Option<ReferenceId>, GraphError> {
        let rows = self.select(&reference_query(disease, source))?;
        Ok(reference_key(&rows).map(|key| ReferenceId::new(source, key)))
    }
}
