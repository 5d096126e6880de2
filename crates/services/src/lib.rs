#![forbid(unsafe_code)]

pub mod api;
pub mod bootstrap;
pub mod error;
pub mod sessions;

pub use vetquiz_core::Clock;
pub use sessions as session;

pub use api::{AttemptResult, HttpQuizApi, QuizApi};
pub use bootstrap::{BootstrapOutcome, SessionBootstrap, UserProfile};
pub use error::{ApiError, SessionError};

pub use sessions::{
    Notification, QuizSession, RetryPolicy, SessionAnswerResult, SessionFlowService, SessionPhase,
    SessionProgress, TerminationCause, TickOutcome,
};
