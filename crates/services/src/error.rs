//! Shared error types for the services crate.

use thiserror::Error;

use vetquiz_core::model::{AttemptError, QuizError};

/// Errors emitted by the backend API client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("backend request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("backend response could not be interpreted: {0}")]
    Decode(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// True for failures worth retrying: transport errors and 5xx responses.
    ///
    /// Client errors (4xx) signal a request the backend will keep rejecting.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::HttpStatus(status) => status.is_server_error(),
            Self::Decode(_) => false,
        }
    }
}

/// Errors emitted by the session state machine and its workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("event is not valid in the current session phase")]
    WrongPhase,

    #[error("session already reached a terminal state")]
    AlreadyFinished,

    #[error("no attempt is active for this session")]
    NoAttempt,

    #[error("failed to persist answer after {attempts} attempts")]
    Persist {
        attempts: u32,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error(transparent)]
    Attempt(#[from] AttemptError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
