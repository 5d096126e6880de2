use chrono::{DateTime, Utc};
use std::fmt;

use vetquiz_core::access::{self, AccessDecision, DenialReason};
use vetquiz_core::integrity::{IntegrityCause, IntegrityMonitor, IntegrityViolation};
use vetquiz_core::model::{Answer, Attempt, AttemptId, AttemptSummary, Quiz, UserId};
use vetquiz_core::timer::{AttemptTimer, TimerEvent, TimerState};

use super::view::Notification;
use crate::api::AttemptResult;
use crate::error::SessionError;
use super::progress::SessionProgress;

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Why a session ended in `Terminated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationCause {
    AccessDenied(DenialReason),
    Integrity(IntegrityCause),
    Abandoned,
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessDenied(reason) => write!(f, "access denied: {reason}"),
            Self::Integrity(cause) => write!(f, "integrity violation: {cause}"),
            Self::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Lifecycle phase of a quiz-taking session.
///
/// `Instructions → AccessCheck → InProgress → {Submitted | Terminated}`,
/// strictly forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Instructions,
    AccessCheck,
    InProgress,
    Submitted,
    Terminated(TerminationCause),
}

impl SessionPhase {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted | Self::Terminated(_))
    }
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of recording an answer for the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAnswerResult {
    pub question_index: u32,
    pub is_complete: bool,
}

/// What a clock tick did to the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// Question indexes that were auto-answered blank by timer expiry.
    pub blanks_recorded: Vec<u32>,
    /// `Some(forced)` when this tick ended the attempt in `Submitted`.
    pub submitted: Option<bool>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// The quiz session state machine.
///
/// A synchronous value: the workflow serializes clock ticks, user events, and
/// integrity callbacks onto it, so transitions never interleave and the
/// attempt has exactly one mutator.
pub struct QuizSession {
    quiz: Quiz,
    user_id: UserId,
    phase: SessionPhase,
    attempt: Option<Attempt>,
    timer: Option<AttemptTimer>,
    monitor: IntegrityMonitor,
    notifications: Vec<Notification>,
    result: Option<AttemptResult>,
}

impl QuizSession {
    /// Create a session showing the instructions screen.
    #[must_use]
    pub fn new(quiz: Quiz, user_id: UserId) -> Self {
        Self {
            quiz,
            user_id,
            phase: SessionPhase::Instructions,
            attempt: None,
            timer: None,
            monitor: IntegrityMonitor::new(),
            notifications: Vec::new(),
            result: None,
        }
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    #[must_use]
    pub fn attempt(&self) -> Option<&Attempt> {
        self.attempt.as_ref()
    }

    /// Countdown snapshot for rendering; `None` before the attempt starts.
    #[must_use]
    pub fn timer_state(&self) -> Option<TimerState> {
        self.timer.as_ref().map(AttemptTimer::snapshot)
    }

    /// Final score record, once the backend has acknowledged submission.
    #[must_use]
    pub fn result(&self) -> Option<&AttemptResult> {
        self.result.as_ref()
    }

    pub(crate) fn set_result(&mut self, result: AttemptResult) {
        self.result = Some(result);
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let (total, answered) = self
            .attempt
            .as_ref()
            .map_or((0, 0), |a| (a.total_questions(), a.answered_count()));
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.phase.is_terminal(),
        }
    }

    /// Take all pending one-shot notifications for display.
    #[must_use]
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub(crate) fn push_notification(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    /// Leave the instructions screen.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongPhase` unless the session is at
    /// `Instructions`.
    pub fn continue_to_access_check(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Instructions {
            return Err(self.phase_error());
        }
        self.phase = SessionPhase::AccessCheck;
        Ok(())
    }

    /// Run the access guard against the user's attempt history.
    ///
    /// A denial is terminal: the session moves to `Terminated` with the
    /// denial as cause and no attempt is ever created.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongPhase` unless the session is at
    /// `AccessCheck`.
    pub fn evaluate_access(
        &mut self,
        history: &[AttemptSummary],
        now: DateTime<Utc>,
    ) -> Result<AccessDecision, SessionError> {
        if self.phase != SessionPhase::AccessCheck {
            return Err(self.phase_error());
        }

        let decision = access::check(&self.quiz, history, now);
        if let AccessDecision::Denied { reason, subtitle } = &decision {
            self.notifications.push(Notification::AccessDenied {
                reason: *reason,
                subtitle: subtitle.clone(),
            });
            self.phase = SessionPhase::Terminated(TerminationCause::AccessDenied(*reason));
        }
        Ok(decision)
    }

    /// Enter `InProgress` with a freshly created attempt.
    ///
    /// Starts the attempt at question 1, builds the countdown timer from the
    /// quiz limits, and arms the integrity monitor.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongPhase` unless the session is at
    /// `AccessCheck`, and propagates attempt start failures.
    pub fn begin_attempt(
        &mut self,
        mut attempt: Attempt,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if self.phase != SessionPhase::AccessCheck {
            return Err(self.phase_error());
        }

        attempt.start(now)?;
        self.timer = Some(AttemptTimer::for_quiz(&self.quiz));
        self.monitor.arm();
        self.attempt = Some(attempt);
        self.phase = SessionPhase::InProgress;
        Ok(())
    }

    /// Record the user's answer for the current question and advance.
    ///
    /// Moves to `Submitted` when this was the last question; otherwise the
    /// per-question countdown is reset for the next one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyFinished` in terminal phases and
    /// `SessionError::WrongPhase` before the attempt starts.
    pub fn record_answer(
        &mut self,
        value: Answer,
        now: DateTime<Utc>,
    ) -> Result<SessionAnswerResult, SessionError> {
        if self.phase != SessionPhase::InProgress {
            return Err(self.phase_error());
        }
        let attempt = self.attempt.as_mut().ok_or(SessionError::NoAttempt)?;

        let question_index = attempt.record_answer(value, now)?.question_index;
        let is_complete = attempt.is_finished();

        if is_complete {
            self.finish_submitted(false);
        } else if let Some(timer) = self.timer.as_mut() {
            timer.reset_question();
        }

        Ok(SessionAnswerResult {
            question_index,
            is_complete,
        })
    }

    /// Advance the countdowns by `elapsed_secs` of wall time.
    ///
    /// Timer warnings become notifications; a per-question expiry records a
    /// blank answer and advances; a whole-quiz expiry force-submits with the
    /// remaining questions blank. Ticks outside `InProgress` are no-ops.
    ///
    /// # Errors
    ///
    /// Propagates attempt mutation failures, which indicate a bug in the
    /// caller's event ordering rather than a user-visible condition.
    pub fn tick(
        &mut self,
        elapsed_secs: u32,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, SessionError> {
        let mut outcome = TickOutcome::default();
        if self.phase != SessionPhase::InProgress {
            return Ok(outcome);
        }
        let Some(timer) = self.timer.as_mut() else {
            return Ok(outcome);
        };

        let events = timer.tick(elapsed_secs);
        for event in events {
            match event {
                TimerEvent::QuizWarning(level) => {
                    self.notifications.push(Notification::QuizTimeWarning(level));
                }
                TimerEvent::QuestionWarning => {
                    self.notifications.push(Notification::QuestionTimeWarning);
                }
                TimerEvent::QuestionExpired => {
                    let attempt = self.attempt.as_mut().ok_or(SessionError::NoAttempt)?;
                    let index = attempt.record_answer(Answer::Blank, now)?.question_index;
                    outcome.blanks_recorded.push(index);

                    if attempt.is_finished() {
                        self.finish_submitted(false);
                        outcome.submitted = Some(false);
                    } else if let Some(timer) = self.timer.as_mut() {
                        timer.reset_question();
                    }
                }
                TimerEvent::QuizExpired => {
                    let attempt = self.attempt.as_mut().ok_or(SessionError::NoAttempt)?;
                    let first_blank = attempt.current_question();
                    let total = attempt.total_questions();
                    attempt.force_submit(now)?;
                    outcome.blanks_recorded.extend(first_blank..=total);

                    self.finish_submitted(true);
                    outcome.submitted = Some(true);
                }
            }
            if self.phase.is_terminal() {
                break;
            }
        }

        Ok(outcome)
    }

    /// Feed an integrity signal into the session.
    ///
    /// The first accepted violation terminates the attempt outright; anything
    /// after that, and any signal outside `InProgress`, is a no-op.
    pub fn report_signal(
        &mut self,
        cause: IntegrityCause,
        now: DateTime<Utc>,
    ) -> Option<IntegrityViolation> {
        if self.phase != SessionPhase::InProgress {
            return None;
        }

        let violation = self.monitor.observe(cause, now)?;
        if let Some(attempt) = self.attempt.as_mut() {
            // The attempt is in progress here; terminate cannot fail.
            let _ = attempt.terminate(now);
        }
        self.shutdown();
        self.phase = SessionPhase::Terminated(TerminationCause::Integrity(cause));
        self.notifications
            .push(Notification::Terminated(TerminationCause::Integrity(cause)));
        Some(violation)
    }

    /// End the session because the user navigated away.
    ///
    /// Idempotent; terminal sessions are left untouched. Returns the id of the
    /// attempt that was abandoned mid-flight, if any, so the workflow can
    /// report it to the backend.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Option<AttemptId> {
        if self.phase.is_terminal() {
            return None;
        }

        let abandoned = if self.phase == SessionPhase::InProgress {
            self.attempt.as_mut().and_then(|attempt| {
                attempt.terminate(now).ok()?;
                Some(attempt.id())
            })
        } else {
            None
        };

        self.shutdown();
        self.phase = SessionPhase::Terminated(TerminationCause::Abandoned);
        abandoned
    }

    fn finish_submitted(&mut self, forced: bool) {
        self.shutdown();
        self.phase = SessionPhase::Submitted;
        self.notifications.push(Notification::Submitted { forced });
    }

    /// Cancel the timer and unsubscribe the monitor; both idempotent.
    fn shutdown(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.cancel();
        }
        self.monitor.disarm();
    }

    fn phase_error(&self) -> SessionError {
        if self.phase.is_terminal() {
            SessionError::AlreadyFinished
        } else {
            SessionError::WrongPhase
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", &self.quiz.id())
            .field("user_id", &self.user_id)
            .field("phase", &self.phase)
            .field("attempt_id", &self.attempt.as_ref().map(Attempt::id))
            .field("pending_notifications", &self.notifications.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
