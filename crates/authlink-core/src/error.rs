//! Error types for record linking
//!
//! Linking and punctuation errors are recoverable: the affected task is
//! abandoned and everything else continues. Store and resolver errors are
//! surfaced by the collaborators and classified by the pipeline.

use crate::record::RecordRef;
use std::fmt;
use thiserror::Error;

/// Which end of a lifespan a year belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeEvent {
    Birth,
    Death,
}

impl fmt::Display for LifeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifeEvent::Birth => f.write_str("birth"),
            LifeEvent::Death => f.write_str("death"),
        }
    }
}

/// Field matching and reconciliation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// No name field matched any query term
    #[error("Could not find field")]
    FieldNotFound,

    /// Only a see-also (8XX) field matched
    #[error("Found only 8XX field for linking")]
    OnlySeeAlso,

    /// A numeric date subfield cannot be rebuilt from the year sources
    #[error("Record contains 100d '{date}' with content that cannot be reconstructed from 046")]
    UnreconstructableDate { date: String },

    /// The field already links somewhere else
    #[error("Field ({field}) already has 0 link that is different from the one being added {expected}")]
    ConflictingLink { field: String, expected: String },

    /// Structured years and the date subfield disagree
    #[error("Record has year of {event} in 046 ({structured}) and 100d ({heading}) and they are mismatched")]
    YearMismatch {
        event: LifeEvent,
        structured: String,
        heading: String,
    },

    /// The authorized portion of a field cannot be located
    #[error("Could not find authorized portion for field {field}: {reason}")]
    AuthorizedPortion { field: String, reason: String },
}

/// Punctuation fixer failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Punctuation error in field {field}: {message}")]
pub struct PunctuationError {
    pub field: String,
    pub message: String,
}

/// Either failure a reconciliation step can produce
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Punctuation(#[from] PunctuationError),
}

/// Record store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(RecordRef),

    /// The store answered but refused the write
    #[error("Saving {record} was rejected: {reason}")]
    Rejected { record: RecordRef, reason: String },

    /// Stored content could not be decoded
    #[error("Malformed record {record}: {reason}")]
    Malformed { record: RecordRef, reason: String },

    /// Local state (checkpoint, allow-list) that cannot be parsed
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// External id resolution failures
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Resolved into 0 records: {local_id}")]
    NoMatch { local_id: String },

    #[error("Resolved into multiple records: {local_id} ({})", .candidates.join(", "))]
    Ambiguous {
        local_id: String,
        candidates: Vec<String>,
    },

    #[error("Malformed resolver response: {0}")]
    Malformed(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Text form parse failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot parse '{line}': {reason}")]
pub struct RecordParseError {
    pub line: String,
    pub reason: String,
}

impl RecordParseError {
    pub fn new(line: &str, reason: &str) -> Self {
        Self {
            line: line.to_string(),
            reason: reason.to_string(),
        }
    }
}
