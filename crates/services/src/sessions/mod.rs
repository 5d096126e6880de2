mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::{
    QuizSession, SessionAnswerResult, SessionPhase, TerminationCause, TickOutcome,
};
pub use view::Notification;
pub use workflow::{RetryPolicy, SessionFlowService};
