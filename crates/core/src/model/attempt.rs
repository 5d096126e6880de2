use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{AttemptId, QuizId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt must have at least one question")]
    NoQuestions,

    #[error("attempt has not been started")]
    NotStarted,

    #[error("attempt was already started")]
    AlreadyStarted,

    #[error("attempt already reached a terminal state")]
    AlreadyFinished,
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle status of an attempt.
///
/// Transitions are monotonic and one-directional:
/// `NotStarted → InProgress → {Submitted | Terminated}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    Submitted,
    Terminated,
}

impl AttemptStatus {
    /// Returns true for `Submitted` and `Terminated`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Submitted | Self::Terminated)
    }
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// The value recorded for a single question.
///
/// `Blank` is what timer expiry records; scoring of blanks is the backend's
/// contract, not ours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Blank,
    Response(String),
}

impl Answer {
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }
}

/// An answer bound to its question index, immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAnswer {
    pub question_index: u32,
    pub value: Answer,
    pub recorded_at: DateTime<Utc>,
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// One user's try at a quiz.
///
/// Answers are an append-only ordered sequence; `current_question` is 1-based
/// and advances by exactly one per recorded answer, never past
/// `total_questions`. Only the session state machine mutates an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    id: AttemptId,
    user_id: UserId,
    quiz_id: QuizId,
    current_question: u32,
    total_questions: u32,
    status: AttemptStatus,
    answers: Vec<RecordedAnswer>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Attempt {
    /// Creates a not-yet-started attempt.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NoQuestions` if `total_questions` is zero.
    pub fn new(
        id: AttemptId,
        user_id: UserId,
        quiz_id: QuizId,
        total_questions: u32,
    ) -> Result<Self, AttemptError> {
        if total_questions == 0 {
            return Err(AttemptError::NoQuestions);
        }
        Ok(Self {
            id,
            user_id,
            quiz_id,
            current_question: 1,
            total_questions,
            status: AttemptStatus::NotStarted,
            answers: Vec::new(),
            started_at: None,
            finished_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    /// 1-based index of the question currently presented.
    #[must_use]
    pub fn current_question(&self) -> u32 {
        self.current_question
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    #[must_use]
    pub fn answers(&self) -> &[RecordedAnswer] {
        &self.answers
    }

    #[must_use]
    pub fn answered_count(&self) -> u32 {
        u32::try_from(self.answers.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move from `NotStarted` to `InProgress`.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::AlreadyStarted` unless the attempt is `NotStarted`.
    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), AttemptError> {
        if self.status != AttemptStatus::NotStarted {
            return Err(AttemptError::AlreadyStarted);
        }
        self.status = AttemptStatus::InProgress;
        self.started_at = Some(at);
        Ok(())
    }

    /// Record an answer for the current question and advance.
    ///
    /// Automatically transitions to `Submitted` when the last question is
    /// answered.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NotStarted` before `start`, and
    /// `AttemptError::AlreadyFinished` once terminal.
    pub fn record_answer(
        &mut self,
        value: Answer,
        at: DateTime<Utc>,
    ) -> Result<&RecordedAnswer, AttemptError> {
        match self.status {
            AttemptStatus::NotStarted => return Err(AttemptError::NotStarted),
            AttemptStatus::InProgress => {}
            AttemptStatus::Submitted | AttemptStatus::Terminated => {
                return Err(AttemptError::AlreadyFinished);
            }
        }

        let question_index = self.current_question;
        self.answers.push(RecordedAnswer {
            question_index,
            value,
            recorded_at: at,
        });

        if question_index >= self.total_questions {
            self.status = AttemptStatus::Submitted;
            self.finished_at = Some(at);
        } else {
            self.current_question += 1;
        }

        self.answers.last().ok_or(AttemptError::AlreadyFinished)
    }

    /// Submit immediately, recording `Blank` for every unanswered question.
    ///
    /// Used when the whole-quiz timer expires.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NotStarted` before `start`, and
    /// `AttemptError::AlreadyFinished` once terminal.
    pub fn force_submit(&mut self, at: DateTime<Utc>) -> Result<(), AttemptError> {
        match self.status {
            AttemptStatus::NotStarted => return Err(AttemptError::NotStarted),
            AttemptStatus::InProgress => {}
            AttemptStatus::Submitted | AttemptStatus::Terminated => {
                return Err(AttemptError::AlreadyFinished);
            }
        }

        for index in self.current_question..=self.total_questions {
            self.answers.push(RecordedAnswer {
                question_index: index,
                value: Answer::Blank,
                recorded_at: at,
            });
        }
        self.current_question = self.total_questions;
        self.status = AttemptStatus::Submitted;
        self.finished_at = Some(at);
        Ok(())
    }

    /// Terminate the attempt without submitting remaining answers.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::AlreadyFinished` once terminal.
    pub fn terminate(&mut self, at: DateTime<Utc>) -> Result<(), AttemptError> {
        if self.status.is_terminal() {
            return Err(AttemptError::AlreadyFinished);
        }
        self.status = AttemptStatus::Terminated;
        self.finished_at = Some(at);
        Ok(())
    }
}

//
// ─── ATTEMPT SUMMARY ───────────────────────────────────────────────────────────
//

/// Condensed prior-attempt record from the backend, used by the access guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSummary {
    pub id: AttemptId,
    pub status: AttemptStatus,
    pub finished_at: Option<DateTime<Utc>>,
}

impl AttemptSummary {
    /// Completed attempts are what count toward `max_attempts`.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
