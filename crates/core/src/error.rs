// Central Error Type for the Sync Engine

use crate::port::RemoteError;
use thiserror::Error;

/// Application-level error type
///
/// Only configuration and transport failures unwind the call stack.
/// Per-item remote errors are data (`ErrorRecord`) and never show up here.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Setup incomplete: {0}")]
    SetupIncomplete(String),

    #[error("Remote catalog call failed on chunk {chunk}: {source}")]
    RemoteCallFailed {
        chunk: usize,
        #[source]
        source: RemoteError,
    },

    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Job error: {0}")]
    Job(String),
}

impl AppError {
    /// Fatal errors abort the whole operation; nothing is retried automatically
    pub fn is_setup_error(&self) -> bool {
        matches!(self, AppError::SetupIncomplete(_) | AppError::Config(_))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by converting to AppError::Storage(String)
