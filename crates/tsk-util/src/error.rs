//! Error types for the tsk pipeline.
//!
//! Errors are sum-typed by kind rather than by call site. Every phase of
//! the pipeline reports through this one enum so that the driver can map
//! a failure to the correct process exit code.

use thiserror::Error;

/// Main error type for the tsk pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Tokenization failure: unterminated string, invalid escape,
    /// invalid codepoint.
    #[error("Lex error: {0}")]
    Lex(String),

    /// Malformed filter grammar, mismatched parentheses, unknown
    /// attribute modifier, inverted range, malformed ID/UUID list.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A user-supplied prefix matched two or more canonical names in the
    /// same category. Candidates are reported sorted.
    #[error("Ambiguous {category} '{input}' - could be either of {}", .candidates.join(", "))]
    Ambiguity {
        category: String,
        input: String,
        candidates: Vec<String>,
    },

    /// An attribute value failed its column validator.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A write command was issued with an empty filter and confirmation
    /// declined or unavailable.
    #[error("Safety check failed: {0}")]
    Safety(String),

    /// Lock contention or store I/O failure.
    #[error("Store error: {0}")]
    Store(String),

    /// A hook program exited nonzero or produced malformed output.
    #[error("Hook error: {0}")]
    Hook(String),

    /// I/O failure outside the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for unexpected conditions.
    #[error("{0}")]
    Unknown(String),
}

impl Error {
    /// Build an ambiguity error with its candidate list sorted.
    pub fn ambiguity(category: &str, input: &str, mut candidates: Vec<String>) -> Self {
        candidates.sort();
        Error::Ambiguity {
            category: category.to_string(),
            input: input.to_string(),
            candidates,
        }
    }

    /// Process exit code for this error.
    ///
    /// `2` for caught, expected errors; `1` for application errors
    /// surfaced by a command; `3` for anything unexpected.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Lex(_)
            | Error::Parse(_)
            | Error::Ambiguity { .. }
            | Error::Validation(_)
            | Error::Safety(_) => 2,
            Error::Store(_) | Error::Hook(_) | Error::Io(_) => 1,
            Error::Unknown(_) => 3,
        }
    }
}

/// Result type alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_display() {
        let err = Error::Lex("unterminated string".to_string());
        assert_eq!(err.to_string(), "Lex error: unterminated string");
    }

    #[test]
    fn test_ambiguity_candidates_sorted() {
        let err = Error::ambiguity("cmd", "st", vec!["stop".into(), "start".into()]);
        assert_eq!(
            err.to_string(),
            "Ambiguous cmd 'st' - could be either of start, stop"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::Parse("x".into()).exit_code(), 2);
        assert_eq!(Error::Safety("x".into()).exit_code(), 2);
        assert_eq!(Error::Store("x".into()).exit_code(), 1);
        assert_eq!(Error::Hook("x".into()).exit_code(), 1);
        assert_eq!(Error::Unknown("x".into()).exit_code(), 3);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
