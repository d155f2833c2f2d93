//! Error types for isolate-literal

/// Result type for literal evaluation
pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes surfaced to callers of the isolate tooling.
///
/// Every error type in the workspace maps onto one of these so the command
/// line shell can report a stable class regardless of which layer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input; the caller may resubmit corrected input.
    Parse,
    /// An internal invariant was violated. Always fatal.
    Integrity,
    /// The tool was invoked incorrectly.
    Usage,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Parse => "ParseError",
            ErrorKind::Integrity => "IntegrityError",
            ErrorKind::Usage => "UsageError",
        };
        f.write_str(name)
    }
}

/// Errors produced while evaluating a literal expression
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The text is not a valid literal expression
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
        source_text: String,
    },

    /// A value of the wrong type appeared where the grammar constrains it,
    /// e.g. a non-string mapping key. The raw input is part of the message.
    #[error("Type mismatch at line {line}, column {column}: {message}\n{source_text}")]
    TypeMismatch {
        message: String,
        line: usize,
        column: usize,
        source_text: String,
    },

    /// The evaluator finished in an inconsistent state
    #[error("Integrity check failed: {message}")]
    Integrity { message: String },
}

impl Error {
    /// Build a parse error pointing at byte `offset` of `source`.
    pub fn parse(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(source, offset);
        Self::Parse {
            message: message.into(),
            line,
            column,
            source_text: source.to_string(),
        }
    }

    /// Build a type mismatch error pointing at byte `offset` of `source`.
    pub fn type_mismatch(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(source, offset);
        Self::TypeMismatch {
            message: message.into(),
            line,
            column,
            source_text: source.to_string(),
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
            Error::Parse { .. } | Error::TypeMismatch { .. } => ErrorKind::Parse,
            Error::Integrity { .. } => ErrorKind::Integrity,
        }
    }

    /// The text that failed to evaluate, when the error concerns input text.
    pub fn source_text(&self) -> Option<&str> {
        match self {
            Error::Parse { source_text, .. } | Error::TypeMismatch { source_text, .. } => {
                Some(source_text)
            }
            Error::Integrity { .. } => None,
        }
    }
}

/// 1-based line and column (in characters) of byte `offset` within `source`.
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let prefix = source.get(..offset).unwrap_or(source);
    let line = prefix.matches('\n').count() + 1;
    let line_start = prefix.rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    let column = prefix[line_start..].chars().count() + 1;
    (line, column)
}
