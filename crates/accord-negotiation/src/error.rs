//! Negotiation error taxonomy

use std::time::Duration;

use accord_llm::LLMError;
use thiserror::Error;

/// Generated text could not be reduced to a valid proposal.
///
/// `candidate` is the cleaned text the decoder actually saw.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unparseable proposal: {reason} (candidate: {candidate:?})")]
pub struct ParseError {
    pub candidate: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(candidate: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            reason: reason.into(),
        }
    }
}

/// Which time limit fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    /// A single generation call
    Call,
    /// The whole negotiation
    Deadline,
}

impl std::fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "generation call"),
            Self::Deadline => write!(f, "negotiation deadline"),
        }
    }
}

/// Errors that abort a negotiation. No partial settlement accompanies them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NegotiationError {
    #[error("Generation failed: {0}")]
    Generation(#[from] LLMError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Timed out: {kind} exceeded {after:?}")]
    Timeout { kind: TimeoutKind, after: Duration },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl NegotiationError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NegotiationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_keeps_candidate() {
        let err: NegotiationError = ParseError::new("{oops", "invalid JSON").into();
        let text = err.to_string();
        assert!(text.contains("invalid JSON"));
        assert!(text.contains("{oops"));
    }

    #[test]
    fn test_timeout_display() {
        let err = NegotiationError::Timeout {
            kind: TimeoutKind::Call,
            after: Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "Timed out: generation call exceeded 3s");
    }
}
