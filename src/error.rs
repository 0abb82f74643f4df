//! Error taxonomy for user-facing actions.
//!
//! Every action the UI or CLI can trigger returns `Result<_, AssistError>`.
//! None of these variants is fatal to a session: the presentation layer
//! renders the message inline and the next action proceeds normally.
//!
//! "The model could not answer from the context" is not an
//! error. See [`Answer::NoAnswer`](crate::answer::Answer::NoAnswer).

use thiserror::Error;

/// Failure of a single assistant action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssistError {
    /// Out-of-range marks, an empty required field, or an otherwise malformed request.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The chat or embedding provider was unreachable, rejected the request,
    /// rate limited us, or timed out.
    #[error("upstream request failed: {0}")]
    TransportFailure(String),

    /// Indexed retrieval was attempted before `campus ingest` built the store.
    #[error("knowledge store not found: {0} (run `campus ingest` first)")]
    StoreNotFound(String),
}

impl AssistError {
    /// Machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AssistError::InvalidInput(_) => "invalid_input",
            AssistError::TransportFailure(_) => "transport_failure",
            AssistError::StoreNotFound(_) => "store_not_found",
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AssistError::InvalidInput(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        AssistError::TransportFailure(message.into())
    }
}

impl From<reqwest::Error> for AssistError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AssistError::TransportFailure(format!("request timed out: {}", err))
        } else {
            AssistError::TransportFailure(err.to_string())
        }
    }
}

/// Result alias for assistant actions.
pub type AssistResult<T> = std::result::Result<T, AssistError>;
