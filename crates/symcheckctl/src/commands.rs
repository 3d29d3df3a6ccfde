//! Command implementations for symcheckctl

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use tracing::{info, warn};

use symcheck_common::config::SymcheckConfig;
use symcheck_common::{
    rank, remaining_distinct_groups, CandidateResolver, Evidence, KnowledgeGraph, LabelMap,
    Navigator, NavigatorSettings, QuestionAssistant, ReferenceLibrary, ReferenceSource, Session,
    SymcheckError, SymptomId,
};

use crate::assistant::ChatAssistant;
use crate::demo;
use crate::errors::{EXIT_GENERAL_ERROR, EXIT_SUCCESS};
use crate::interactive::{phase_label, run_check, Outcome, Terminal};
use crate::medline::MedlinePlusLibrary;
use crate::render::{render_ranking, render_report};
use crate::sparql::DbpediaGraph;
use crate::wikipedia::WikipediaLibrary;

/// The collaborators a session talks to.
pub struct Collaborators {
    graph: Box<dyn KnowledgeGraph>,
    library: Box<dyn ReferenceLibrary>,
    assistant: Option<Box<dyn QuestionAssistant>>,
}

impl Collaborators {
    /// DBpedia, the configured reference source and (if enabled) the
    /// chat assistant.
    pub fn online(config: &SymcheckConfig) -> Result<Self> {
        let graph = DbpediaGraph::new(&config.graph).context("Failed to build graph client")?;
        let user_agent = &config.graph.user_agent;
        let library: Box<dyn ReferenceLibrary> = match config.reference.source {
            ReferenceSource::Wikipedia => Box::new(
                WikipediaLibrary::new(&config.reference, user_agent)
                    .context("Failed to build Wikipedia client")?,
            ),
            ReferenceSource::MedlinePlus => Box::new(
                MedlinePlusLibrary::new(&config.reference, user_agent)
                    .context("Failed to build MedlinePlus client")?,
            ),
        };
        info!("Knowledge graph: {}", graph.endpoint());

        Ok(Self {
            graph: Box::new(graph),
            library,
            assistant: Self::assistant(config),
        })
    }

    /// Built-in demo graph and articles; the assistant is still used when
    /// enabled.
    pub fn offline_demo(config: &SymcheckConfig) -> Self {
        Self {
            graph: Box::new(demo::graph()),
            library: Box::new(demo::library()),
            assistant: Self::assistant(config),
        }
    }

    fn assistant(config: &SymcheckConfig) -> Option<Box<dyn QuestionAssistant>> {
        if !config.assistant.enabled {
            return None;
        }
        match ChatAssistant::new(&config.assistant) {
            Ok(assistant) => {
                info!("Assistant: {} at {}", assistant.model(), config.assistant.base_url);
                Some(Box::new(assistant))
            }
            Err(e) => {
                warn!("Assistant disabled: {}", e);
                None
            }
        }
    }

    pub fn navigator(&self, settings: NavigatorSettings) -> Navigator<'_> {
        let nav = Navigator::new(self.graph.as_ref(), self.library.as_ref(), settings);
        match &self.assistant {
            Some(assistant) => nav.with_assistant(assistant.as_ref()),
            None => nav,
        }
    }

    pub fn graph(&self) -> &dyn KnowledgeGraph {
        self.graph.as_ref()
    }
}

/// `check`: run an interactive session on the terminal.
pub fn check(
    collab: &Collaborators,
    settings: NavigatorSettings,
    symptoms: &[String],
    json: bool,
) -> Result<i32> {
    let nav = collab.navigator(settings);
    let mut session = Session::new();
    let mut term = Terminal::stdio();

    let outcome = run_check(&nav, &mut session, &mut term, symptoms)?;
    let mut out = std::io::stdout();
    match outcome {
        Outcome::Finished(report) => {
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                render_report(&report, &mut out)?;
            }
            Ok(EXIT_SUCCESS)
        }
        Outcome::Quit => {
            writeln!(
                out,
                "{}",
                format!("Check cancelled while {}.", phase_label(session.phase())).dimmed()
            )?;
            Ok(EXIT_GENERAL_ERROR)
        }
    }
}

fn resolve_all(
    labels: &LabelMap<SymptomId>,
    inputs: &[String],
) -> std::result::Result<Vec<SymptomId>, SymcheckError> {
    inputs
        .iter()
        .map(|input| {
            if let Some(id) = labels.resolve_label(input) {
                return Ok(id.clone());
            }
            let id = SymptomId::new(input.trim());
            if labels.contains_id(&id) {
                Ok(id)
            } else {
                Err(SymcheckError::UnknownSymptom(input.clone()))
            }
        })
        .collect()
}

/// `symptoms`: list the symptoms that can still be reported alongside
/// `given`, optionally filtered by `search`.
pub fn symptoms<W: Write>(
    collab: &Collaborators,
    settings: NavigatorSettings,
    search: Option<&str>,
    given: &[String],
    out: &mut W,
) -> Result<i32> {
    let nav = collab.navigator(settings);
    let mut session = Session::new();
    for symptom in given {
        nav.report_symptom(&mut session, symptom)
            .with_context(|| format!("Cannot use '{}'", symptom))?;
    }

    let choices = nav.symptom_choices(&session)?;
    let matches = choices.search(search.unwrap_or(""));
    for (label, id) in &matches {
        writeln!(out, "{}  {}", label, id.as_str().dimmed())?;
    }
    writeln!(out, "{}", format!("{} found", matches.len()).dimmed())?;
    Ok(EXIT_SUCCESS)
}

/// `rank`: one-shot entropy ranking for a fixed set of answers.
pub fn rank_symptoms<W: Write>(
    collab: &Collaborators,
    settings: &NavigatorSettings,
    given: &[String],
    not: &[String],
    out: &mut W,
) -> Result<i32> {
    let graph = collab.graph();
    let labels = settings
        .retry
        .run("all_symptoms", || graph.all_symptoms())?;

    let mut evidence = Evidence::new();
    for id in resolve_all(&labels, given)? {
        evidence.confirm(id)?;
    }
    for id in resolve_all(&labels, not)? {
        evidence.exclude(id)?;
    }
    let snapshot = evidence.snapshot();

    let resolver = CandidateResolver::new(graph, settings.retry);
    let confirmed: BTreeSet<SymptomId> = snapshot.confirmed.clone();
    let candidates = resolver
        .resolve(&confirmed)?
        .narrow(&snapshot, settings.exclusion_policy);

    let groups = remaining_distinct_groups(&candidates, &snapshot.excluded);
    writeln!(
        out,
        "{}",
        format!("{} candidate conditions, {} distinguishable", candidates.len(), groups)
            .bright_white()
            .bold()
    )?;
    let ranking = rank(&candidates, &snapshot);
    render_ranking(&ranking, |r| labels.label_or_fallback(&r.symptom), out)?;
    Ok(EXIT_SUCCESS)
}

/// `config`: show the effective configuration, or write the defaults.
pub fn config<W: Write>(path: &Path, init: bool, out: &mut W) -> Result<i32> {
    if init {
        if path.exists() {
            writeln!(out, "{}  {} already exists", "!".yellow(), path.display())?;
            return Ok(EXIT_GENERAL_ERROR);
        }
        SymcheckConfig::default()
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        writeln!(out, "{}  Wrote {}", "+".bright_green(), path.display())?;
        return Ok(EXIT_SUCCESS);
    }

    let config = SymcheckConfig::load_or_default(path);
    writeln!(out, "{}", format!("# {}", path.display()).dimmed())?;
    write!(out, "{}", toml::to_string_pretty(&config)?)?;
    Ok(EXIT_SUCCESS)
}
