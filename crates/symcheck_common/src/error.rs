//! Error types for symcheck.
//!
//! "No matching condition" and "no reference article" are ordinary values
//! (`Step::NoMatchingCondition`, `Description::NotFound`), not errors.

use thiserror::Error;

use crate::labels::LabelConflict;

#[derive(Error, Debug)]
pub enum SymcheckError {
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    ResolutionFailed {
        operation: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unknown symptom: {0}")]
    UnknownSymptom(String),

    #[error("Label mapping error: {0}")]
    Label(#[from] LabelConflict),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SymcheckError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        SymcheckError::InvalidState(msg.into())
    }

    /// Stable numeric code, used in JSON output and logs.
    pub fn code(&self) -> i32 {
        match self {
            SymcheckError::ResolutionFailed { .. } => -32001,
            SymcheckError::InvalidState(_) => -32002,
            SymcheckError::UnknownSymptom(_) => -32003,
            SymcheckError::Label(_) => -32004,
            SymcheckError::Config(_) => -32005,
            SymcheckError::Io(_) => -32006,
            SymcheckError::Toml(_) => -32007,
        }
    }

    /// True for failures the operator may retry without resetting the session.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SymcheckError::ResolutionFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, SymcheckError>;
