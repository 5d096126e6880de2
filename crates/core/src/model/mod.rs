mod attempt;
mod ids;
mod quiz;

pub use ids::{AttemptId, ParseIdError, QuizId, UserId};

pub use attempt::{
    Answer, Attempt, AttemptError, AttemptStatus, AttemptSummary, RecordedAnswer,
};
pub use quiz::{Quiz, QuizError};
