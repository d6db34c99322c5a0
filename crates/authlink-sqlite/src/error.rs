//! Error types for SQLite storage

use authlink_core::{ResolveError, StoreError};
use thiserror::Error;

/// SQLite storage error type
#[derive(Error, Debug)]
pub enum SqliteError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Schema/migration error
    #[error("Schema error: {0}")]
    Schema(String),

    /// Input that cannot be imported
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Blocking task failed to complete
    #[error("Task error: {0}")]
    Task(String),

    /// Underlying rusqlite error
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for SQLite operations
pub type SqliteResult<T> = Result<T, SqliteError>;

impl From<tokio::task::JoinError> for SqliteError {
    fn from(err: tokio::task::JoinError) -> Self {
        SqliteError::Task(err.to_string())
    }
}

impl From<SqliteError> for StoreError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::InvalidRecord(msg) => StoreError::InvalidData(msg),
            other => StoreError::Transport(other.to_string()),
        }
    }
}

impl From<SqliteError> for ResolveError {
    fn from(err: SqliteError) -> Self {
        ResolveError::Transport(err.to_string())
    }
}
