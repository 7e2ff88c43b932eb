//! Error types for goodnight-core

use thiserror::Error;

/// Result type alias using goodnight-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in goodnight-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote log store refused the request
    #[error("Remote store rejected the request: {0}")]
    Rejected(String),

    /// Local identity storage failed
    #[error("Identity storage error: {0}")]
    IdentityStorage(String),
}
