//! Access guard for starting a quiz attempt.
//!
//! Side-effect free and idempotent; the UI may re-check as often as it likes.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::model::{AttemptSummary, Quiz};
use crate::registration::{self, RegistrationStatus};

/// Why an attempt may not be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    RegistrationNotStarted,
    RegistrationClosed,
    AttemptsExhausted,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistrationNotStarted => write!(f, "registration has not started"),
            Self::RegistrationClosed => write!(f, "registration is closed"),
            Self::AttemptsExhausted => write!(f, "no attempts remaining"),
        }
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied {
        reason: DenialReason,
        subtitle: Option<String>,
    },
}

impl AccessDecision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Decide whether a user may enter a new attempt for `quiz` at `now`.
///
/// The registration window is evaluated first; a window that is not open
/// denies with the window status as the reason. Attempt limits apply next:
/// `max_attempts == 0` means unlimited, otherwise completed prior attempts
/// (submitted or terminated) count against the cap.
#[must_use]
pub fn check(quiz: &Quiz, history: &[AttemptSummary], now: DateTime<Utc>) -> AccessDecision {
    let window = registration::evaluate(quiz, now);
    match window.status {
        RegistrationStatus::NotStarted => {
            return AccessDecision::Denied {
                reason: DenialReason::RegistrationNotStarted,
                subtitle: window.subtitle,
            };
        }
        RegistrationStatus::Closed => {
            return AccessDecision::Denied {
                reason: DenialReason::RegistrationClosed,
                subtitle: window.subtitle,
            };
        }
        RegistrationStatus::Open => {}
    }

    let max = quiz.max_attempts();
    if max > 0 {
        let completed = history.iter().filter(|a| a.is_completed()).count();
        if completed >= max as usize {
            return AccessDecision::Denied {
                reason: DenialReason::AttemptsExhausted,
                subtitle: None,
            };
        }
    }

    AccessDecision::Allowed
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttemptId, AttemptStatus, QuizId};
    use crate::time::fixed_now;
    use chrono::Duration;
    use uuid::Uuid;

    fn quiz_with_limit(max_attempts: u32) -> Quiz {
        Quiz::new(
            QuizId::new(1),
            "Surgery basics",
            None,
            None,
            None,
            max_attempts,
            false,
            None,
            None,
        )
        .unwrap()
    }

    fn completed_summary(status: AttemptStatus) -> AttemptSummary {
        AttemptSummary {
            id: AttemptId::new(Uuid::new_v4()),
            status,
            finished_at: Some(fixed_now()),
        }
    }

    #[test]
    fn open_quiz_with_no_history_is_allowed() {
        let quiz = quiz_with_limit(0);
        assert!(check(&quiz, &[], fixed_now()).is_allowed());
    }

    #[test]
    fn exhausted_attempts_are_denied() {
        let quiz = quiz_with_limit(2);
        let history = vec![
            completed_summary(AttemptStatus::Submitted),
            completed_summary(AttemptStatus::Terminated),
        ];

        let decision = check(&quiz, &history, fixed_now());
        assert!(matches!(
            decision,
            AccessDecision::Denied {
                reason: DenialReason::AttemptsExhausted,
                ..
            }
        ));
    }

    #[test]
    fn in_progress_attempts_do_not_count() {
        let quiz = quiz_with_limit(1);
        let history = vec![completed_summary(AttemptStatus::InProgress)];
        assert!(check(&quiz, &history, fixed_now()).is_allowed());
    }

    #[test]
    fn zero_max_attempts_means_unlimited() {
        let quiz = quiz_with_limit(0);
        let history: Vec<_> = (0..10)
            .map(|_| completed_summary(AttemptStatus::Submitted))
            .collect();
        assert!(check(&quiz, &history, fixed_now()).is_allowed());
    }

    #[test]
    fn window_is_checked_before_attempt_limits() {
        let start = fixed_now() + Duration::hours(1);
        let quiz = Quiz::new(
            QuizId::new(1),
            "Surgery basics",
            None,
            None,
            None,
            2,
            true,
            Some(start),
            Some(start + Duration::hours(1)),
        )
        .unwrap();
        let history = vec![
            completed_summary(AttemptStatus::Submitted),
            completed_summary(AttemptStatus::Submitted),
        ];

        let decision = check(&quiz, &history, fixed_now());
        assert!(matches!(
            decision,
            AccessDecision::Denied {
                reason: DenialReason::RegistrationNotStarted,
                ..
            }
        ));
    }

    #[test]
    fn check_is_idempotent() {
        let quiz = quiz_with_limit(2);
        let history = vec![completed_summary(AttemptStatus::Submitted)];
        let first = check(&quiz, &history, fixed_now());
        let second = check(&quiz, &history, fixed_now());
        assert_eq!(first, second);
    }
}
