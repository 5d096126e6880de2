use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use vetquiz_core::integrity::IntegrityCause;
use vetquiz_core::model::{Answer, Attempt, AttemptId, QuizId, UserId};
use vetquiz_core::Clock;

use super::service::{QuizSession, SessionAnswerResult, SessionPhase, TerminationCause, TickOutcome};
use super::view::Notification;
use crate::api::QuizApi;
use crate::error::SessionError;

/// Bounded exponential backoff for answer persistence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    /// Zero-delay policy for tests.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_ms: 0,
        }
    }

    /// Delay before retry number `attempt` (1-based): base doubling per
    /// attempt with ±50% jitter to avoid thundering retries.
    fn delay_for(&self, attempt: u32) -> Duration {
        if self.base_delay_ms == 0 {
            return Duration::ZERO;
        }
        let backoff = self
            .base_delay_ms
            .saturating_mul(1_u64 << attempt.min(16).saturating_sub(1));
        let jitter = rand::rng().random_range(0.5..=1.5);
        Duration::from_millis((backoff as f64 * jitter) as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 250,
        }
    }
}

/// Orchestrates the quiz session against the backend.
///
/// Serializes the three external signal sources (clock ticks, user input,
/// integrity callbacks) onto the session state machine, and owns the only
/// awaited operation: answer persistence. Completions of in-flight calls are
/// applied to the attempt only while the session is still in progress.
#[derive(Clone)]
pub struct SessionFlowService {
    clock: Clock,
    api: Arc<dyn QuizApi>,
    retry: RetryPolicy,
}

impl SessionFlowService {
    #[must_use]
    pub fn new(clock: Clock, api: Arc<dyn QuizApi>) -> Self {
        Self {
            clock,
            api,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch the quiz definition and open a session at the instructions
    /// screen.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the quiz cannot be fetched.
    pub async fn start_session(
        &self,
        quiz_id: QuizId,
        user_id: UserId,
    ) -> Result<QuizSession, SessionError> {
        let quiz = self.api.fetch_quiz(quiz_id).await?;
        tracing::debug!(%quiz_id, title = quiz.title(), "session opened at instructions");
        Ok(QuizSession::new(quiz, user_id))
    }

    /// Handle the "Continue" action on the instructions screen.
    ///
    /// Runs the access check against the user's attempt history; when allowed,
    /// creates the attempt on the backend and moves the session in progress.
    /// A denial terminates the session without creating an attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongPhase` off the instructions screen and
    /// `SessionError::Api` for backend failures.
    pub async fn enter_quiz(&self, session: &mut QuizSession) -> Result<bool, SessionError> {
        session.continue_to_access_check()?;

        let quiz_id = session.quiz().id();
        let user_id = session.user_id();
        let history = self.api.fetch_attempt_history(quiz_id, user_id).await?;

        let decision = session.evaluate_access(&history, self.clock.now())?;
        if !decision.is_allowed() {
            // Expected, user-facing outcome; not a system fault.
            tracing::info!(%quiz_id, %user_id, ?decision, "quiz access denied");
            return Ok(false);
        }

        let attempt = self.api.start_attempt(quiz_id, user_id).await?;
        tracing::info!(%quiz_id, attempt_id = %attempt.id(), "attempt started");
        session.begin_attempt(attempt, self.clock.now())?;
        Ok(true)
    }

    /// Persist and record the user's answer for the current question.
    ///
    /// The backend write happens first; the local state machine advances only
    /// if the session is still in progress once the write completes. A stale
    /// completion (the session terminated while the call was in flight) is
    /// discarded and reported as `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Persist` when bounded retries are exhausted; the
    /// session stays in progress and the user may try again.
    pub async fn answer_current(
        &self,
        session: &mut QuizSession,
        value: Answer,
    ) -> Result<Option<SessionAnswerResult>, SessionError> {
        let (attempt_id, question_index) = current_question_of(session)?;

        if let Err(err) = self
            .persist_with_retry(attempt_id, question_index, &value)
            .await
        {
            if let SessionError::Persist { attempts, .. } = &err {
                session.push_notification(Notification::AnswerSaveFailed { attempts: *attempts });
            }
            return Err(err);
        }

        if *session.phase() != SessionPhase::InProgress {
            tracing::debug!(%attempt_id, question_index, "discarding stale answer completion");
            return Ok(None);
        }

        let result = session.record_answer(value, self.clock.now())?;
        if result.is_complete {
            self.submit(session, attempt_id, false).await?;
        }
        Ok(Some(result))
    }

    /// Advance the session clock by `elapsed_secs`.
    ///
    /// Blank answers recorded by per-question expiry are persisted
    /// best-effort; a forced submission already instructs the backend to
    /// blank-fill, so no blanks are written in that case.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if a resulting submission cannot be sent.
    pub async fn tick(
        &self,
        session: &mut QuizSession,
        elapsed_secs: u32,
    ) -> Result<TickOutcome, SessionError> {
        let attempt_id = session.attempt().map(Attempt::id);
        let outcome = session.tick(elapsed_secs, self.clock.now())?;

        let Some(attempt_id) = attempt_id else {
            return Ok(outcome);
        };

        if outcome.submitted != Some(true) {
            for &question_index in &outcome.blanks_recorded {
                if let Err(err) = self
                    .persist_with_retry(attempt_id, question_index, &Answer::Blank)
                    .await
                {
                    // Recoverable: surfaced, never escalated to termination.
                    tracing::warn!(%attempt_id, question_index, %err, "blank answer not persisted");
                    if let SessionError::Persist { attempts, .. } = &err {
                        session.push_notification(Notification::AnswerSaveFailed {
                            attempts: *attempts,
                        });
                    }
                }
            }
        }

        if let Some(forced) = outcome.submitted {
            self.submit(session, attempt_id, forced).await?;
        }
        Ok(outcome)
    }

    /// Route an environment integrity signal into the session.
    ///
    /// Termination is decided locally and is authoritative; failure to notify
    /// the backend is logged but does not resurrect the attempt.
    pub async fn report_violation(&self, session: &mut QuizSession, cause: IntegrityCause) {
        let attempt_id = session.attempt().map(Attempt::id);
        let Some(violation) = session.report_signal(cause, self.clock.now()) else {
            return;
        };

        // Logged as its own category; never conflated with infrastructure errors.
        tracing::warn!(cause = %violation.cause, "attempt terminated for integrity violation");
        if let Some(attempt_id) = attempt_id {
            let reason = TerminationCause::Integrity(cause).to_string();
            if let Err(err) = self.api.terminate_attempt(attempt_id, &reason).await {
                tracing::error!(%attempt_id, %err, "failed to report termination to backend");
            }
        }
    }

    /// Tear the session down because the user navigated away. Idempotent.
    pub async fn cancel(&self, session: &mut QuizSession) {
        let Some(attempt_id) = session.cancel(self.clock.now()) else {
            return;
        };
        let reason = TerminationCause::Abandoned.to_string();
        if let Err(err) = self.api.terminate_attempt(attempt_id, &reason).await {
            tracing::warn!(%attempt_id, %err, "failed to report abandoned attempt");
        }
    }

    async fn submit(
        &self,
        session: &mut QuizSession,
        attempt_id: AttemptId,
        forced: bool,
    ) -> Result<(), SessionError> {
        let mut tries = 0;
        loop {
            tries += 1;
            match self.api.submit_attempt(attempt_id, forced).await {
                Ok(result) => {
                    tracing::info!(%attempt_id, forced, passed = result.passed, "attempt submitted");
                    session.set_result(result);
                    return Ok(());
                }
                Err(err) if err.is_transient() && tries < self.retry.max_attempts => {
                    tracing::warn!(%attempt_id, %err, tries, "submit failed; retrying");
                    tokio::time::sleep(self.retry.delay_for(tries)).await;
                }
                Err(err) => return Err(SessionError::Api(err)),
            }
        }
    }

    async fn persist_with_retry(
        &self,
        attempt_id: AttemptId,
        question_index: u32,
        value: &Answer,
    ) -> Result<(), SessionError> {
        let mut tries = 0;
        loop {
            tries += 1;
            match self
                .api
                .persist_answer(attempt_id, question_index, value)
                .await
            {
                Ok(()) => return Ok(()),
                Err(err) if err.is_transient() && tries < self.retry.max_attempts => {
                    tracing::warn!(%attempt_id, question_index, %err, tries, "persist failed; retrying");
                    tokio::time::sleep(self.retry.delay_for(tries)).await;
                }
                Err(err) => {
                    return Err(SessionError::Persist {
                        attempts: tries,
                        source: err,
                    });
                }
            }
        }
    }
}

fn current_question_of(session: &QuizSession) -> Result<(AttemptId, u32), SessionError> {
    if *session.phase() != SessionPhase::InProgress {
        return Err(if session.phase().is_terminal() {
            SessionError::AlreadyFinished
        } else {
            SessionError::WrongPhase
        });
    }
    let attempt = session.attempt().ok_or(SessionError::NoAttempt)?;
    Ok((attempt.id(), attempt.current_question()))
}
