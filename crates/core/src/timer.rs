//! Per-question and whole-quiz countdowns for an attempt.
//!
//! The timer is a passive value: something else (the session workflow) owns
//! the recurring tick and feeds elapsed seconds in. Warnings are one-shot per
//! threshold crossing and expiries fire exactly once.

use crate::model::Quiz;

/// Whole-quiz warning threshold, in seconds.
pub const QUIZ_WARNING_SECS: u32 = 300;
/// Whole-quiz escalated warning threshold, in seconds.
pub const QUIZ_CRITICAL_SECS: u32 = 60;
/// Per-question warning threshold, in seconds.
pub const QUESTION_WARNING_SECS: u32 = 10;

/// Escalation level for whole-quiz warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizWarning {
    /// Under five minutes remain; informational.
    FiveMinutes,
    /// Under one minute remains; submission is imminent.
    OneMinute,
}

/// Events produced by a tick, in the order they should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    QuizWarning(QuizWarning),
    QuestionWarning,
    /// The per-question countdown reached zero: record the current question as
    /// blank and advance.
    QuestionExpired,
    /// The whole-quiz countdown reached zero: force-submit the attempt with
    /// remaining questions blank.
    QuizExpired,
}

/// Read-only snapshot for rendering countdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    pub question_remaining_secs: Option<u32>,
    pub quiz_remaining_secs: Option<u32>,
    pub five_minute_warning_fired: bool,
    pub one_minute_warning_fired: bool,
}

/// Tracks both countdowns for one attempt.
///
/// The question countdown resets on every question transition via
/// [`AttemptTimer::reset_question`]; the quiz countdown is shared across all
/// questions and never resets. Both clamp at zero.
#[derive(Debug, Clone)]
pub struct AttemptTimer {
    question_limit_secs: Option<u32>,
    question_remaining_secs: Option<u32>,
    question_warned: bool,
    question_expired: bool,
    quiz_remaining_secs: Option<u32>,
    quiz_warned_five: bool,
    quiz_warned_one: bool,
    quiz_expired: bool,
}

impl AttemptTimer {
    /// Build a timer from the quiz's configured limits.
    ///
    /// A limit that already sits below a warning threshold pre-arms that
    /// threshold so the warning only fires on a genuine crossing.
    #[must_use]
    pub fn for_quiz(quiz: &Quiz) -> Self {
        let question_limit_secs = quiz.question_time_limit_secs();
        let quiz_remaining_secs = quiz.time_limit_secs();
        Self {
            question_limit_secs,
            question_remaining_secs: question_limit_secs,
            question_warned: question_limit_secs.is_some_and(|s| s < QUESTION_WARNING_SECS),
            question_expired: false,
            quiz_remaining_secs,
            quiz_warned_five: quiz_remaining_secs.is_some_and(|s| s < QUIZ_WARNING_SECS),
            quiz_warned_one: quiz_remaining_secs.is_some_and(|s| s < QUIZ_CRITICAL_SECS),
            quiz_expired: false,
        }
    }

    /// Advance both countdowns by `elapsed_secs` and return the events fired.
    ///
    /// Warnings precede expiries. When the whole-quiz countdown expires in a
    /// tick, the per-question expiry is suppressed: force-submission already
    /// covers the current question. Once the quiz countdown has expired,
    /// further ticks produce no events.
    pub fn tick(&mut self, elapsed_secs: u32) -> Vec<TimerEvent> {
        if self.quiz_expired || elapsed_secs == 0 {
            return Vec::new();
        }

        let mut events = Vec::new();

        if let Some(remaining) = self.quiz_remaining_secs {
            let remaining = remaining.saturating_sub(elapsed_secs);
            self.quiz_remaining_secs = Some(remaining);

            if !self.quiz_warned_five && remaining < QUIZ_WARNING_SECS && remaining > 0 {
                self.quiz_warned_five = true;
                events.push(TimerEvent::QuizWarning(QuizWarning::FiveMinutes));
            }
            if !self.quiz_warned_one && remaining < QUIZ_CRITICAL_SECS && remaining > 0 {
                self.quiz_warned_one = true;
                events.push(TimerEvent::QuizWarning(QuizWarning::OneMinute));
            }
        }

        let quiz_expires = self.quiz_remaining_secs == Some(0);

        if let Some(remaining) = self.question_remaining_secs {
            let remaining = if self.question_expired {
                remaining
            } else {
                remaining.saturating_sub(elapsed_secs)
            };
            self.question_remaining_secs = Some(remaining);

            if !quiz_expires && !self.question_expired {
                if !self.question_warned && remaining < QUESTION_WARNING_SECS && remaining > 0 {
                    self.question_warned = true;
                    events.push(TimerEvent::QuestionWarning);
                }
                if remaining == 0 {
                    self.question_expired = true;
                    events.push(TimerEvent::QuestionExpired);
                }
            }
        }

        if quiz_expires {
            self.quiz_expired = true;
            events.push(TimerEvent::QuizExpired);
        }

        events
    }

    /// Reset the per-question countdown for a newly presented question.
    pub fn reset_question(&mut self) {
        self.question_remaining_secs = self.question_limit_secs;
        self.question_warned = self
            .question_limit_secs
            .is_some_and(|s| s < QUESTION_WARNING_SECS);
        self.question_expired = false;
    }

    /// Stop the timer entirely; later ticks are no-ops.
    ///
    /// Idempotent, called on termination or navigation away.
    pub fn cancel(&mut self) {
        self.quiz_expired = true;
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.quiz_expired
    }

    #[must_use]
    pub fn snapshot(&self) -> TimerState {
        TimerState {
            question_remaining_secs: self.question_remaining_secs,
            quiz_remaining_secs: self.quiz_remaining_secs,
            five_minute_warning_fired: self.quiz_warned_five,
            one_minute_warning_fired: self.quiz_warned_one,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuizId;

    fn timed_quiz(limit_minutes: Option<u32>, question_secs: Option<u32>) -> Quiz {
        Quiz::new(
            QuizId::new(1),
            "Radiology",
            None,
            limit_minutes,
            question_secs,
            0,
            false,
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn question_expiry_fires_exactly_once() {
        let quiz = timed_quiz(None, Some(30));
        let mut timer = AttemptTimer::for_quiz(&quiz);

        let mut expiries = 0;
        for _ in 0..30 {
            let events = timer.tick(1);
            expiries += events
                .iter()
                .filter(|e| **e == TimerEvent::QuestionExpired)
                .count();
        }
        assert_eq!(expiries, 1);

        // Repeated ticks at the boundary stay silent.
        assert!(timer.tick(1).is_empty());
        assert!(timer.tick(5).is_empty());
        assert_eq!(timer.snapshot().question_remaining_secs, Some(0));
    }

    #[test]
    fn question_warning_fires_once_below_ten_seconds() {
        let quiz = timed_quiz(None, Some(30));
        let mut timer = AttemptTimer::for_quiz(&quiz);

        assert!(timer.tick(20).is_empty());
        assert_eq!(timer.tick(1), vec![TimerEvent::QuestionWarning]);
        assert!(timer.tick(1).is_empty());
    }

    #[test]
    fn reset_rearms_the_question_countdown() {
        let quiz = timed_quiz(None, Some(30));
        let mut timer = AttemptTimer::for_quiz(&quiz);
        timer.tick(30);

        timer.reset_question();
        assert_eq!(timer.snapshot().question_remaining_secs, Some(30));
        let events = timer.tick(30);
        assert!(events.contains(&TimerEvent::QuestionExpired));
    }

    #[test]
    fn five_minute_warning_fires_once_across_the_crossing() {
        // 10-minute quiz; walk to 301s remaining, then cross to 299s.
        let quiz = timed_quiz(Some(10), None);
        let mut timer = AttemptTimer::for_quiz(&quiz);

        assert!(timer.tick(299).is_empty());
        let events = timer.tick(2);
        assert_eq!(events, vec![TimerEvent::QuizWarning(QuizWarning::FiveMinutes)]);

        // Further ticks inside the interval fire nothing.
        assert!(timer.tick(1).is_empty());
        assert!(timer.tick(10).is_empty());
    }

    #[test]
    fn one_minute_warning_escalates() {
        let quiz = timed_quiz(Some(2), None);
        let mut timer = AttemptTimer::for_quiz(&quiz);

        // 120s limit is already below the 5-minute threshold, so only the
        // escalated warning can fire.
        let events = timer.tick(61);
        assert_eq!(events, vec![TimerEvent::QuizWarning(QuizWarning::OneMinute)]);
        assert!(timer.tick(10).is_empty());
    }

    #[test]
    fn quiz_expiry_is_terminal() {
        let quiz = timed_quiz(Some(1), None);
        let mut timer = AttemptTimer::for_quiz(&quiz);

        let events = timer.tick(60);
        assert_eq!(events, vec![TimerEvent::QuizExpired]);
        assert!(timer.tick(60).is_empty());
        assert_eq!(timer.snapshot().quiz_remaining_secs, Some(0));
    }

    #[test]
    fn quiz_expiry_suppresses_question_expiry() {
        let quiz = timed_quiz(Some(1), Some(30));
        let mut timer = AttemptTimer::for_quiz(&quiz);
        timer.tick(29);
        timer.reset_question();

        // Question and quiz both hit zero here; force-submit covers the question.
        let events = timer.tick(31);
        assert_eq!(events, vec![TimerEvent::QuizExpired]);
    }

    #[test]
    fn untimed_quiz_never_emits_events() {
        let quiz = timed_quiz(None, None);
        let mut timer = AttemptTimer::for_quiz(&quiz);
        assert!(timer.tick(10_000).is_empty());
        let snap = timer.snapshot();
        assert_eq!(snap.quiz_remaining_secs, None);
        assert_eq!(snap.question_remaining_secs, None);
    }

    #[test]
    fn cancel_is_idempotent() {
        let quiz = timed_quiz(Some(10), Some(30));
        let mut timer = AttemptTimer::for_quiz(&quiz);
        timer.cancel();
        timer.cancel();
        assert!(timer.is_stopped());
        assert!(timer.tick(600).is_empty());
    }
}
