//! Error types.
//!
//! `ScorerError` represents failures talking to a semantic scorer. It is
//! defined here rather than in `markwise-scorer` so the answer scorer can
//! downcast and classify errors (retry or not, how to phrase the degraded
//! explanation) without string matching.

use thiserror::Error;

/// Errors that can occur when calling a semantic scorer.
#[derive(Debug, Error)]
pub enum ScorerError {
    /// The call did not complete within the configured timeout.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// The server could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The server answered 2xx but the body is not the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ScorerError {
    /// Returns `true` if a retry may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ScorerError::Timeout(_) | ScorerError::Network(_) => true,
            ScorerError::Api { status, .. } => *status == 429 || *status >= 500,
            ScorerError::InvalidResponse(_) => false,
        }
    }
}

/// Fatal input problems detected before an evaluation starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The answer key has no entries.
    #[error("answer key '{0}' has no questions")]
    EmptyAnswerKey(String),

    /// No student submissions were supplied.
    #[error("no student submissions to evaluate")]
    EmptyStudentList,

    /// An input file could not be parsed into the expected structure.
    #[error("malformed input {path}: {reason}")]
    MalformedInput { path: String, reason: String },
}
