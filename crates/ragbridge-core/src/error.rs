//! Error types for ragbridge-core

use thiserror::Error;

use crate::models::{BindStatus, RunStatus};

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Run {run_id} ended with status {status}: {reason}")]
    RunFailed {
        run_id: String,
        status: RunStatus,
        reason: String,
    },

    #[error("Binding file {file_id} ended with status {status}")]
    BindFailed { file_id: String, status: BindStatus },

    #[error("Gave up polling {what} after {attempts} attempts")]
    PollTimeout { what: String, attempts: u32 },

    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("Assistant is not ready")]
    NotReady,
}

/// Result type alias using Error.
pub type Result<T> = std::result::Result<T, Error>;
