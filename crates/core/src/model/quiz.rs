use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::QuizId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("quiz time limit must be > 0 minutes when set")]
    InvalidTimeLimit,

    #[error("per-question time limit must be > 0 seconds when set")]
    InvalidQuestionTimeLimit,

    #[error("registration window start is after its end")]
    InvalidRegistrationWindow,
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Definition of a quiz as delivered by the backend.
///
/// Immutable once loaded for a session. Registration bounds may be absent even
/// when `has_registration_time_limit` is set; the registration evaluator treats
/// that as a closed window rather than granting access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    title: String,
    description: Option<String>,
    time_limit_minutes: Option<u32>,
    question_time_limit_secs: Option<u32>,
    max_attempts: u32,
    has_registration_time_limit: bool,
    registration_starts_at: Option<DateTime<Utc>>,
    registration_ends_at: Option<DateTime<Utc>>,
}

impl Quiz {
    /// Creates a validated quiz definition.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTitle` if the title is blank,
    /// `QuizError::InvalidTimeLimit` / `InvalidQuestionTimeLimit` for zero
    /// limits, and `QuizError::InvalidRegistrationWindow` when both bounds are
    /// present but reversed.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        description: Option<String>,
        time_limit_minutes: Option<u32>,
        question_time_limit_secs: Option<u32>,
        max_attempts: u32,
        has_registration_time_limit: bool,
        registration_starts_at: Option<DateTime<Utc>>,
        registration_ends_at: Option<DateTime<Utc>>,
    ) -> Result<Self, QuizError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        if time_limit_minutes == Some(0) {
            return Err(QuizError::InvalidTimeLimit);
        }
        if question_time_limit_secs == Some(0) {
            return Err(QuizError::InvalidQuestionTimeLimit);
        }
        if let (Some(start), Some(end)) = (registration_starts_at, registration_ends_at) {
            if start > end {
                return Err(QuizError::InvalidRegistrationWindow);
            }
        }

        Ok(Self {
            id,
            title,
            description,
            time_limit_minutes,
            question_time_limit_secs,
            max_attempts,
            has_registration_time_limit,
            registration_starts_at,
            registration_ends_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whole-quiz time limit in minutes, if the quiz is timed.
    #[must_use]
    pub fn time_limit_minutes(&self) -> Option<u32> {
        self.time_limit_minutes
    }

    /// Whole-quiz time limit in seconds, if the quiz is timed.
    #[must_use]
    pub fn time_limit_secs(&self) -> Option<u32> {
        self.time_limit_minutes.map(|m| m.saturating_mul(60))
    }

    /// Per-question countdown in seconds, if questions are individually timed.
    #[must_use]
    pub fn question_time_limit_secs(&self) -> Option<u32> {
        self.question_time_limit_secs
    }

    /// Maximum number of attempts per user; 0 means unlimited.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn has_registration_time_limit(&self) -> bool {
        self.has_registration_time_limit
    }

    #[must_use]
    pub fn registration_starts_at(&self) -> Option<DateTime<Utc>> {
        self.registration_starts_at
    }

    #[must_use]
    pub fn registration_ends_at(&self) -> Option<DateTime<Utc>> {
        self.registration_ends_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn empty_title_is_rejected() {
        let err = Quiz::new(
            QuizId::new(1),
            "   ",
            None,
            None,
            None,
            0,
            false,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, QuizError::EmptyTitle));
    }

    #[test]
    fn zero_time_limit_is_rejected() {
        let err = Quiz::new(
            QuizId::new(1),
            "Anatomy",
            None,
            Some(0),
            None,
            0,
            false,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, QuizError::InvalidTimeLimit));
    }

    #[test]
    fn reversed_registration_window_is_rejected() {
        let now = fixed_now();
        let err = Quiz::new(
            QuizId::new(1),
            "Anatomy",
            None,
            None,
            None,
            0,
            true,
            Some(now),
            Some(now - Duration::hours(1)),
        )
        .unwrap_err();
        assert!(matches!(err, QuizError::InvalidRegistrationWindow));
    }

    #[test]
    fn time_limit_converts_to_seconds() {
        let quiz = Quiz::new(
            QuizId::new(1),
            "Anatomy",
            None,
            Some(30),
            Some(45),
            2,
            false,
            None,
            None,
        )
        .unwrap();
        assert_eq!(quiz.time_limit_secs(), Some(1800));
        assert_eq!(quiz.question_time_limit_secs(), Some(45));
    }
}
