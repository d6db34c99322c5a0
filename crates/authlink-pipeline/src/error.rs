//! Pipeline error taxonomy
//!
//! Every failure maps to one [`ErrorClass`]. Only [`ErrorClass::System`]
//! propagates to the scan controller; everything else is recovered where
//! it happens and the affected task or id is abandoned.

use authlink_core::{LinkError, PunctuationError, ReconcileError, ResolveError, StoreError};
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Reaction class of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transport and contract failures: restart the scan
    System,
    /// No unique union id: skip the source id or sub-target
    Resolution,
    /// Matching, validation and record-level store failures: abandon the task
    Linking,
    /// Punctuation failures: abandon the task
    Punctuation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::System => "SYSTEM-ERROR",
            ErrorClass::Resolution => "RESOLUTION-ERROR",
            ErrorClass::Linking => "LINKING-ERROR",
            ErrorClass::Punctuation => "PUNCTUATION-ERROR",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Punctuation(#[from] PunctuationError),

    /// No handler is registered for a task variant
    #[error("No handler registered for {0}")]
    MissingHandler(String),
}

impl From<ReconcileError> for PipelineError {
    fn from(error: ReconcileError) -> Self {
        match error {
            ReconcileError::Link(e) => PipelineError::Link(e),
            ReconcileError::Punctuation(e) => PipelineError::Punctuation(e),
        }
    }
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::Store(StoreError::Transport(_) | StoreError::InvalidData(_)) => {
                ErrorClass::System
            }
            PipelineError::Store(_) => ErrorClass::Linking,
            PipelineError::Resolve(ResolveError::NoMatch { .. } | ResolveError::Ambiguous { .. }) => {
                ErrorClass::Resolution
            }
            PipelineError::Resolve(_) => ErrorClass::System,
            PipelineError::Link(_) => ErrorClass::Linking,
            PipelineError::Punctuation(_) => ErrorClass::Punctuation,
            PipelineError::MissingHandler(_) => ErrorClass::System,
        }
    }

    pub fn is_system(&self) -> bool {
        self.class() == ErrorClass::System
    }
}
