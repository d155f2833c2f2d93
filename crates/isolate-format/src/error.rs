//! Error types for isolate-format

use std::path::PathBuf;

use isolate_literal::ErrorKind;

/// Result type for isolate-format operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or serializing a manifest
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The manifest text (or an include) failed literal evaluation
    #[error(transparent)]
    Literal(#[from] isolate_literal::Error),

    /// The evaluated manifest does not follow the isolate schema
    #[error("Invalid isolate manifest: {message}")]
    InvalidManifest { message: String },

    /// A condition expression could not be parsed
    #[error("Invalid condition {expr:?}: {message}")]
    InvalidCondition { expr: String, message: String },

    /// An include could not be read
    #[error("Failed to read include {path}: {source}")]
    Include {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The isolate directory given by the caller is not absolute
    #[error("Isolate directory must be an absolute path: {path}")]
    RelativeIsolateDir { path: PathBuf },

    /// Not every configuration variable was given a value
    #[error("These configuration variables were missing from the command line: {missing:?}")]
    MissingConfigVariables { missing: Vec<String> },

    /// An internal invariant of the configuration table was violated
    #[error("Integrity check failed: {message}")]
    Integrity { message: String },
}

impl Error {
    pub fn invalid_manifest(message: impl Into<String>) -> Self {
        Self::InvalidManifest {
            message: message.into(),
        }
    }

    pub fn invalid_condition(expr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCondition {
            expr: expr.into(),
            message: message.into(),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }

    /// The failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Literal(e) => e.kind(),
            Error::InvalidManifest { .. }
            | Error::InvalidCondition { .. }
            | Error::Include { .. } => ErrorKind::Parse,
            Error::RelativeIsolateDir { .. } | Error::MissingConfigVariables { .. } => {
                ErrorKind::Usage
            }
            Error::Integrity { .. } => ErrorKind::Integrity,
        }
    }

    /// The offending input text, for errors raised while evaluating text.
    pub fn source_text(&self) -> Option<&str> {
        match self {
            Error::Literal(e) => e.source_text(),
            _ => None,
        }
    }
}
