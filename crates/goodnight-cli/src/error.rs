use std::io;

use goodnight_core::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] goodnight_core::Error),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Record ID cannot be empty")]
    EmptyRecordId,
    #[error("Record not found for id/prefix: {0}")]
    RecordNotFound(String),
    #[error("{0}")]
    AmbiguousRecordId(String),
    #[error(
        "No identity chosen. Run `goodnight identity choose spouse-A` (or spouse-B) first."
    )]
    IdentityNotChosen,
    #[error("Refusing to {0} without confirmation; pass --yes to skip the prompt.")]
    ConfirmationRequired(&'static str),
    #[error("Timed out waiting for the log to load")]
    LoadTimeout,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
}
