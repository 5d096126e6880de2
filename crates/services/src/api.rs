//! Backend API surface consumed by the session workflow.
//!
//! The trait keeps the workflow testable with an in-memory fake; the HTTP
//! implementation maps wire DTOs into validated domain values at the edge.
//! Timestamps that fail to parse decode to `None` so the registration
//! evaluator fails closed instead of granting access on garbage data.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vetquiz_core::model::{
    Answer, Attempt, AttemptId, AttemptStatus, AttemptSummary, Quiz, QuizId, UserId,
};

use crate::error::ApiError;

/// Final score record returned when an attempt is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttemptResult {
    pub points_earned: u32,
    pub total_possible: u32,
    pub passed: bool,
}

/// Operations the quiz session needs from the backend.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// Fetch a quiz definition by id.
    async fn fetch_quiz(&self, quiz_id: QuizId) -> Result<Quiz, ApiError>;

    /// Fetch the user's prior attempts for a quiz.
    async fn fetch_attempt_history(
        &self,
        quiz_id: QuizId,
        user_id: UserId,
    ) -> Result<Vec<AttemptSummary>, ApiError>;

    /// Create a fresh attempt for the user.
    async fn start_attempt(&self, quiz_id: QuizId, user_id: UserId) -> Result<Attempt, ApiError>;

    /// Persist one answer. Ack-only; the backend owns grading.
    async fn persist_answer(
        &self,
        attempt_id: AttemptId,
        question_index: u32,
        answer: &Answer,
    ) -> Result<(), ApiError>;

    /// Submit the attempt, `forced` when the whole-quiz timer expired.
    async fn submit_attempt(
        &self,
        attempt_id: AttemptId,
        forced: bool,
    ) -> Result<AttemptResult, ApiError>;

    /// Report a forced termination (integrity violation or abandonment).
    async fn terminate_attempt(&self, attempt_id: AttemptId, reason: &str) -> Result<(), ApiError>;
}

//
// ─── WIRE DTOS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct QuizDto {
    id: u64,
    title: String,
    description: Option<String>,
    time_limit_minutes: Option<u32>,
    question_time_limit_secs: Option<u32>,
    #[serde(default)]
    max_attempts: u32,
    #[serde(default)]
    has_registration_time_limit: bool,
    registration_starts_at: Option<String>,
    registration_ends_at: Option<String>,
}

impl QuizDto {
    fn into_quiz(self) -> Result<Quiz, ApiError> {
        Quiz::new(
            QuizId::new(self.id),
            self.title,
            self.description,
            self.time_limit_minutes,
            self.question_time_limit_secs,
            self.max_attempts,
            self.has_registration_time_limit,
            parse_timestamp(self.registration_starts_at.as_deref()),
            parse_timestamp(self.registration_ends_at.as_deref()),
        )
        .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct AttemptDto {
    id: Uuid,
    user_id: Uuid,
    quiz_id: u64,
    total_questions: u32,
}

impl AttemptDto {
    fn into_attempt(self) -> Result<Attempt, ApiError> {
        Attempt::new(
            AttemptId::new(self.id),
            UserId::new(self.user_id),
            QuizId::new(self.quiz_id),
            self.total_questions,
        )
        .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct AttemptSummaryDto {
    id: Uuid,
    status: String,
    finished_at: Option<String>,
}

impl AttemptSummaryDto {
    fn into_summary(self) -> Result<AttemptSummary, ApiError> {
        let status = match self.status.as_str() {
            "not_started" => AttemptStatus::NotStarted,
            "in_progress" => AttemptStatus::InProgress,
            "submitted" => AttemptStatus::Submitted,
            "terminated" => AttemptStatus::Terminated,
            other => {
                return Err(ApiError::Decode(format!("unknown attempt status {other:?}")));
            }
        };
        Ok(AttemptSummary {
            id: AttemptId::new(self.id),
            status,
            finished_at: parse_timestamp(self.finished_at.as_deref()),
        })
    }
}

#[derive(Debug, Serialize)]
struct AnswerPayload<'a> {
    question_index: u32,
    /// `None` encodes a blank answer.
    value: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SubmitPayload {
    forced: bool,
}

#[derive(Debug, Serialize)]
struct TerminatePayload<'a> {
    reason: &'a str,
}

/// Lenient RFC 3339 parse; malformed input becomes `None` (and fails closed
/// downstream) rather than an error that would block the whole quiz payload.
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(err) => {
            tracing::warn!(%raw, %err, "discarding unparseable timestamp");
            None
        }
    }
}

//
// ─── HTTP CLIENT ───────────────────────────────────────────────────────────────
//

/// `QuizApi` over the platform's REST backend.
#[derive(Clone)]
pub struct HttpQuizApi {
    client: Client,
    base_url: String,
}

impl HttpQuizApi {
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::HttpStatus(response.status()))
        }
    }
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn fetch_quiz(&self, quiz_id: QuizId) -> Result<Quiz, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/api/quizzes/{quiz_id}")))
            .send()
            .await?;
        let dto: QuizDto = Self::check(response).await?.json().await?;
        dto.into_quiz()
    }

    async fn fetch_attempt_history(
        &self,
        quiz_id: QuizId,
        user_id: UserId,
    ) -> Result<Vec<AttemptSummary>, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/api/quizzes/{quiz_id}/attempts")))
            .query(&[("user_id", user_id.to_string())])
            .send()
            .await?;
        let dtos: Vec<AttemptSummaryDto> = Self::check(response).await?.json().await?;
        dtos.into_iter().map(AttemptSummaryDto::into_summary).collect()
    }

    async fn start_attempt(&self, quiz_id: QuizId, user_id: UserId) -> Result<Attempt, ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/api/quizzes/{quiz_id}/attempts")))
            .json(&serde_json::json!({ "user_id": user_id.to_string() }))
            .send()
            .await?;
        let dto: AttemptDto = Self::check(response).await?.json().await?;
        dto.into_attempt()
    }

    async fn persist_answer(
        &self,
        attempt_id: AttemptId,
        question_index: u32,
        answer: &Answer,
    ) -> Result<(), ApiError> {
        let value = match answer {
            Answer::Blank => None,
            Answer::Response(text) => Some(text.as_str()),
        };
        let response = self
            .client
            .post(self.url(&format!("/api/attempts/{attempt_id}/answers")))
            .json(&AnswerPayload {
                question_index,
                value,
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn submit_attempt(
        &self,
        attempt_id: AttemptId,
        forced: bool,
    ) -> Result<AttemptResult, ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/api/attempts/{attempt_id}/submit")))
            .json(&SubmitPayload { forced })
            .send()
            .await?;
        let result: AttemptResult = Self::check(response).await?.json().await?;
        Ok(result)
    }

    async fn terminate_attempt(&self, attempt_id: AttemptId, reason: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/api/attempts/{attempt_id}/terminate")))
            .json(&TerminatePayload { reason })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_timestamps_decode_to_none() {
        assert!(parse_timestamp(Some("not-a-date")).is_none());
        assert!(parse_timestamp(None).is_none());
        assert!(parse_timestamp(Some("2024-03-01T00:00:00Z")).is_some());
    }

    #[test]
    fn quiz_dto_with_garbage_window_fails_closed_downstream() {
        let dto = QuizDto {
            id: 3,
            title: "Parasitology".into(),
            description: None,
            time_limit_minutes: Some(20),
            question_time_limit_secs: None,
            max_attempts: 1,
            has_registration_time_limit: true,
            registration_starts_at: Some("yesterday".into()),
            registration_ends_at: Some("tomorrow".into()),
        };
        let quiz = dto.into_quiz().unwrap();
        assert!(quiz.registration_starts_at().is_none());
        assert!(quiz.registration_ends_at().is_none());

        let info = vetquiz_core::registration::evaluate(&quiz, vetquiz_core::time::fixed_now());
        assert!(!info.is_open());
    }

    #[test]
    fn unknown_attempt_status_is_a_decode_error() {
        let dto = AttemptSummaryDto {
            id: Uuid::new_v4(),
            status: "paused".into(),
            finished_at: None,
        };
        assert!(matches!(dto.into_summary(), Err(ApiError::Decode(_))));
    }

    #[test]
    fn transient_classification() {
        assert!(ApiError::HttpStatus(reqwest::StatusCode::BAD_GATEWAY).is_transient());
        assert!(!ApiError::HttpStatus(reqwest::StatusCode::FORBIDDEN).is_transient());
        assert!(!ApiError::Decode("x".into()).is_transient());
    }
}
