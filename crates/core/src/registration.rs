//! Registration window evaluation.
//!
//! A pure function of `(quiz, now)`. Never stored: callers recompute it on
//! every access check so the status can never go stale.

use chrono::{DateTime, Utc};

use crate::model::Quiz;

/// Where `now` falls relative to a quiz's registration window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Open,
    NotStarted,
    Closed,
}

/// Derived registration state plus a human-readable subtitle for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationInfo {
    pub status: RegistrationStatus,
    pub subtitle: Option<String>,
}

impl RegistrationInfo {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == RegistrationStatus::Open
    }

    fn open() -> Self {
        Self {
            status: RegistrationStatus::Open,
            subtitle: None,
        }
    }

    fn not_started(opens_at: DateTime<Utc>) -> Self {
        Self {
            status: RegistrationStatus::NotStarted,
            subtitle: Some(format!(
                "Registration opens {}",
                opens_at.format("%Y-%m-%d %H:%M UTC")
            )),
        }
    }

    fn closed(closed_at: DateTime<Utc>) -> Self {
        Self {
            status: RegistrationStatus::Closed,
            subtitle: Some(format!(
                "Registration closed {}",
                closed_at.format("%Y-%m-%d %H:%M UTC")
            )),
        }
    }

    fn unavailable() -> Self {
        Self {
            status: RegistrationStatus::Closed,
            subtitle: Some("Registration times are unavailable".to_string()),
        }
    }
}

/// Evaluate the registration window for a quiz at a given instant.
///
/// Boundaries are inclusive: `now == start` and `now == end` are both `Open`.
/// A quiz with the registration limit flag set but missing either bound fails
/// closed; ambiguous timing data never grants access.
#[must_use]
pub fn evaluate(quiz: &Quiz, now: DateTime<Utc>) -> RegistrationInfo {
    if !quiz.has_registration_time_limit() {
        return RegistrationInfo::open();
    }

    let (Some(start), Some(end)) = (quiz.registration_starts_at(), quiz.registration_ends_at())
    else {
        return RegistrationInfo::unavailable();
    };

    if now < start {
        RegistrationInfo::not_started(start)
    } else if now > end {
        RegistrationInfo::closed(end)
    } else {
        RegistrationInfo::open()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuizId;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn windowed_quiz(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limited: bool,
    ) -> Quiz {
        Quiz::new(
            QuizId::new(1),
            "Pharmacology",
            None,
            None,
            None,
            0,
            limited,
            start,
            end,
        )
        .unwrap()
    }

    #[test]
    fn unlimited_registration_is_always_open() {
        let quiz = windowed_quiz(None, None, false);
        let far_past = fixed_now() - Duration::days(10_000);
        let far_future = fixed_now() + Duration::days(10_000);

        assert!(evaluate(&quiz, far_past).is_open());
        assert!(evaluate(&quiz, fixed_now()).is_open());
        assert!(evaluate(&quiz, far_future).is_open());
    }

    #[test]
    fn boundaries_are_inclusive() {
        let start = fixed_now();
        let end = start + Duration::hours(2);
        let quiz = windowed_quiz(Some(start), Some(end), true);

        assert_eq!(evaluate(&quiz, start).status, RegistrationStatus::Open);
        assert_eq!(evaluate(&quiz, end).status, RegistrationStatus::Open);
        assert_eq!(
            evaluate(&quiz, start - Duration::seconds(1)).status,
            RegistrationStatus::NotStarted
        );
        assert_eq!(
            evaluate(&quiz, end + Duration::seconds(1)).status,
            RegistrationStatus::Closed
        );
    }

    #[test]
    fn not_started_explains_when_it_opens() {
        let start = fixed_now() + Duration::hours(1);
        let quiz = windowed_quiz(Some(start), Some(start + Duration::hours(2)), true);

        let info = evaluate(&quiz, fixed_now());
        assert_eq!(info.status, RegistrationStatus::NotStarted);
        assert!(info.subtitle.unwrap().starts_with("Registration opens"));
    }

    #[test]
    fn missing_bounds_fail_closed() {
        let quiz = windowed_quiz(None, None, true);
        let info = evaluate(&quiz, fixed_now());
        assert_eq!(info.status, RegistrationStatus::Closed);
        assert!(info.subtitle.is_some());

        let quiz = windowed_quiz(Some(fixed_now()), None, true);
        assert_eq!(evaluate(&quiz, fixed_now()).status, RegistrationStatus::Closed);
    }
}
