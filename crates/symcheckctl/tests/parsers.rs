//! Parsing of recorded endpoint responses

use std::collections::BTreeSet;

use symcheck_common::{DiseaseId, SymptomId};
use symcheckctl::medline::parse_article;
use symcheckctl::sparql::{parse_bindings, profiles, reference_key, symptom_labels, symptom_set};
use symcheckctl::wikipedia::{parse_page, parse_response};

// ============================================================================
// SPARQL results
// ============================================================================

const SYMPTOM_ROWS: &str = r#"{
  "head": { "vars": ["symptom", "label"] },
  "results": { "bindings": [
    { "symptom": { "type": "uri", "value": "http://dbpedia.org/resource/Fever" },
      "label": { "type": "literal", "xml:lang": "en", "value": "Fever" } },
    { "symptom": { "type": "uri", "value": "http://dbpedia.org/resource/Cough" },
      "label": { "type": "literal", "xml:lang": "en", "value": "Cough" } },
    { "symptom": { "type": "uri", "value": "http://dbpedia.org/resource/Pyrexia" },
      "label": { "type": "literal", "xml:lang": "en", "value": "Fever" } },
    { "symptom": { "type": "uri", "value": "http://dbpedia.org/resource/Sore_throat" } },
    { "symptom": { "type": "literal", "value": "feeling unwell" } }
  ] }
}"#;

#[test]
fn test_symptom_labels_from_bindings() {
    let rows = parse_bindings(SYMPTOM_ROWS).unwrap();
    assert_eq!(rows.len(), 5);

    let labels = symptom_labels(&rows);
    // literal objects are not resources; the second "Fever" conflicts
    assert_eq!(labels.len(), 3);
    assert_eq!(labels.id_of("Fever"), Some(&SymptomId::new("dbr:Fever")));
    assert_eq!(labels.id_of("Sore throat"), Some(&SymptomId::new("dbr:Sore_throat")));
    assert!(!labels.contains_id(&SymptomId::new("dbr:Pyrexia")));
}

#[test]
fn test_profiles_group_by_disease() {
    let rows = parse_bindings(
        r#"{"head":{"vars":["disease","symptom"]},"results":{"bindings":[
            {"disease":{"type":"uri","value":"http://dbpedia.org/resource/Influenza"},
             "symptom":{"type":"uri","value":"http://dbpedia.org/resource/Fever"}},
            {"disease":{"type":"uri","value":"http://dbpedia.org/resource/Influenza"},
             "symptom":{"type":"uri","value":"http://dbpedia.org/resource/Cough"}},
            {"disease":{"type":"uri","value":"http://dbpedia.org/resource/Measles"},
             "symptom":{"type":"uri","value":"http://dbpedia.org/resource/Rash"}}
        ]}}"#,
    )
    .unwrap();

    let by_disease = profiles(&rows);
    assert_eq!(by_disease.len(), 2);
    let flu: BTreeSet<SymptomId> = ["dbr:Cough", "dbr:Fever"].iter().map(SymptomId::new).collect();
    assert_eq!(by_disease[&DiseaseId::new("dbr:Influenza")], flu);

    let all = symptom_set(&rows);
    assert_eq!(all.len(), 3);
}

#[test]
fn test_reference_key_reads_literals() {
    let rows = parse_bindings(
        r#"{"head":{"vars":["ref"]},"results":{"bindings":[
            {"ref":{"type":"typed-literal","datatype":"http://www.w3.org/2001/XMLSchema#integer","value":"15071"}}
        ]}}"#,
    )
    .unwrap();
    assert_eq!(reference_key(&rows).as_deref(), Some("15071"));

    let empty = parse_bindings(r#"{"head":{"vars":["ref"]},"results":{"bindings":[]}}"#).unwrap();
    assert_eq!(reference_key(&empty), None);
}

// ============================================================================
// MedlinePlus
// ============================================================================

const MEDLINE_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Flu: MedlinePlus Medical Encyclopedia</title></head>
<body>
<div class="page-title"><h1 class="with-also" itemprop="name">Flu</h1></div>
<div id="d-article">
  <div id="ency_summary"><p>The flu is a contagious infection of the nose, throat, and lungs.</p></div>
  <section>
    <div class="section">
      <div class="section-header"><div class="section-title"><h2>Causes</h2></div></div>
      <div class="section-body"><p>The flu is caused by influenza viruses.</p></div>
    </div>
  </section>
  <section>
    <div class="section">
      <div class="section-header"><div class="section-title"><h2>Symptoms</h2></div></div>
      <div class="section-body">
        <p>Symptoms start suddenly:</p>
        <ul><li>Fever</li><li>Dry cough</li></ul>
      </div>
    </div>
  </section>
</div>
</body></html>"#;

#[test]
fn test_medline_article_sections() {
    let article = parse_article(MEDLINE_PAGE).unwrap();
    assert_eq!(article.title, "Flu");
    assert!(article.full_text.contains("contagious infection"));
    assert!(article.full_text.contains("influenza viruses"));

    let symptoms = article.symptoms_section.unwrap();
    assert!(symptoms.contains("Symptoms start suddenly"));
    assert!(symptoms.contains("Dry cough"));
    assert!(!symptoms.contains("influenza viruses"));
}

#[test]
fn test_medline_without_symptom_section() {
    let html = r#"<html><body><h1>Rare thing</h1><div id="d-article"><p>Text only.</p></div></body></html>"#;
    let article = parse_article(html).unwrap();
    assert_eq!(article.symptoms_section, None);
    assert_eq!(article.full_text, "Text only.");
}

#[test]
fn test_medline_without_body_is_a_parse_error() {
    assert!(parse_article("<html><body><p>Moved</p></body></html>").is_err());
}

// ============================================================================
// Wikipedia
// ============================================================================

const WIKI_HTML: &str = r#"<div class="mw-content-ltr mw-parser-output" lang="en" dir="ltr">
<p>Influenza is an infectious disease.</p>
<div class="mw-heading mw-heading2"><h2 id="Signs_and_symptoms">Signs and symptoms</h2><span class="mw-editsection">[edit]</span></div>
<p>Symptoms begin one to four days after infection.</p>
<div class="mw-heading mw-heading3"><h3 id="Complications">Complications</h3></div>
<p>Pneumonia is the most common complication.</p>
<h2>Virology<span class="mw-editsection">[edit]</span></h2>
<p>Four types of influenza virus exist.</p>
</div>"#;

#[test]
fn test_wikipedia_symptom_section_with_subsections() {
    let article = parse_page("Influenza", WIKI_HTML).unwrap();
    assert_eq!(article.title, "Influenza");
    assert!(article.full_text.contains("Four types"));

    let section = article.symptoms_section.unwrap();
    assert!(section.contains("Symptoms begin one to four days"));
    assert!(section.contains("Complications:"));
    assert!(section.contains("Pneumonia"));
    assert!(!section.contains("Four types"));
    assert!(!section.contains("infectious disease"));
}

#[test]
fn test_wikipedia_api_response() {
    let body = serde_json::json!({
        "parse": { "title": "Influenza", "pageid": 15071, "text": WIKI_HTML }
    })
    .to_string();
    let article = parse_response(&body).unwrap().unwrap();
    assert_eq!(article.title, "Influenza");
    assert!(article.symptoms_section.is_some());
}

#[test]
fn test_wikipedia_missing_page_is_none() {
    let body = r#"{"error":{"code":"nosuchpageid","info":"There is no page with ID 1."}}"#;
    assert!(parse_response(body).unwrap().is_none());
    assert!(parse_response("not json").is_err());
}
