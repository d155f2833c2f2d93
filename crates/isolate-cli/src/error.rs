//! Error types for isolate-cli

use isolate_literal::ErrorKind;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from isolate-literal
    #[error(transparent)]
    Literal(#[from] isolate_literal::Error),

    /// Error from isolate-format
    #[error(transparent)]
    Format(#[from] isolate_format::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The result could not be encoded as JSON
    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// The failure class reported on stderr.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CliError::Literal(e) => e.kind(),
            CliError::Format(e) => e.kind(),
            CliError::Io(_) => ErrorKind::Parse,
            CliError::Json(_) => ErrorKind::Integrity,
        }
    }
}
