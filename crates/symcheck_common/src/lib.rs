//! Symcheck Common - question engine and session state for symcheck
//!
//! Pure data, collaborator traits and the session state machine. No
//! network code: the knowledge graph, reference library and assistant are
//! supplied by the caller.

pub mod assist;
pub mod candidates;
pub mod config;
pub mod distinct;
pub mod entropy;
pub mod error;
pub mod evidence;
pub mod graph;
pub mod ids;
pub mod labels;
pub mod memory;
pub mod navigator;
pub mod plausibility;
pub mod reference;
pub mod report;
pub mod retry;
pub mod session;

pub use assist::{AssistContext, AssistError, AssistTurn, Assessment, QuestionAssistant, Severity};
pub use candidates::{Candidate, CandidateResolver, CandidateSet, ExclusionPolicy};
pub use config::SymcheckConfig;
pub use distinct::{distinct_groups, remaining_distinct_groups};
pub use entropy::{binary_entropy, entropy_table, rank, RankedSymptom};
pub use error::{Result, SymcheckError};
pub use evidence::{Answer, Evidence, EvidenceSnapshot, SymptomStatus};
pub use graph::{GraphError, KnowledgeGraph};
pub use ids::{DiseaseId, DiseaseRef, SymptomId};
pub use labels::{LabelConflict, LabelMap};
pub use navigator::{AssistStep, Navigator, NavigatorSettings};
pub use reference::{Article, Description, ReferenceError, ReferenceId, ReferenceLibrary, ReferenceSource};
pub use report::Report;
pub use retry::RetryPolicy;
pub use session::{Phase, Question, Session, Step};
