//! Error types for repoql.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for repoql operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("database name cannot be empty")]
    EmptyDatabaseName,

    #[error("database already registered: {0}")]
    DuplicateDatabase(String),

    #[error("database name is reserved: {0}")]
    ReservedDatabaseName(String),

    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("row does not match schema: {0}")]
    SchemaMismatch(String),

    #[error("repository identifier cannot be empty")]
    EmptyIdentifier,

    #[error("repository already registered: {0}")]
    DuplicateIdentifier(String),

    #[error("repository not found in pool: {0}")]
    RepositoryNotFound(String),

    #[error("cannot open repository at {}: {source}", path.display())]
    CannotOpen {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("query cancelled")]
    Cancelled,

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true for the error raised when a scan's context is cancelled
    /// or its deadline passes.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
