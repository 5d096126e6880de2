//! Cookie-based session bootstrap.
//!
//! The platform uses cookie sessions with CSRF protection: the client first
//! requests a CSRF cookie, then asks who the current user is. A `401` on the
//! user fetch is a normal outcome meaning "nobody is signed in", not a fault.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use vetquiz_core::model::UserId;

use crate::error::ApiError;

/// The authenticated user, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl UserProfile {
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::new(self.id)
    }
}

/// Result of restoring a session on page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Authenticated(UserProfile),
    Anonymous,
}

impl BootstrapOutcome {
    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Anonymous => None,
        }
    }
}

/// Restores the cookie session against the backend.
#[derive(Clone)]
pub struct SessionBootstrap {
    client: Client,
    base_url: String,
}

impl SessionBootstrap {
    /// Build a bootstrap client with a cookie store, required for the CSRF
    /// cookie to carry over to the user fetch.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self::with_client(client, base_url))
    }

    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Fetch the CSRF cookie, then the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport failures and unexpected statuses.
    /// An unauthenticated response maps to `BootstrapOutcome::Anonymous`.
    pub async fn restore_session(&self) -> Result<BootstrapOutcome, ApiError> {
        let csrf = self
            .client
            .get(format!("{}/sanctum/csrf-cookie", self.base_url))
            .send()
            .await?;
        if !csrf.status().is_success() {
            return Err(ApiError::HttpStatus(csrf.status()));
        }

        let response = self
            .client
            .get(format!("{}/api/user", self.base_url))
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                tracing::debug!("no active session; continuing anonymously");
                Ok(BootstrapOutcome::Anonymous)
            }
            status if status.is_success() => {
                let user: UserProfile = response.json().await?;
                tracing::info!(user = %user.id, "session restored");
                Ok(BootstrapOutcome::Authenticated(user))
            }
            status => Err(ApiError::HttpStatus(status)),
        }
    }
}
