//! HTTP client for the auth backend.

use async_trait::async_trait;
use portal_core::observability::{TracedClientExt, TracedRequest};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::config::AuthServiceSettings;
use crate::dtos::auth::{
    CurrentUserResponse, ResendVerificationRequest, VerifyEmailRequest,
};
use crate::dtos::{Credentials, LoginResponse, Registration};
use crate::error::SessionError;
use crate::models::User;

/// Calls the session store makes to the authentication backend.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, SessionError>;

    /// Create an account. Registration is verification-gated, so the body
    /// carries no token; it is handed back to the caller as-is.
    async fn register(&self, registration: &Registration)
        -> Result<serde_json::Value, SessionError>;

    async fn verify_email(&self, token: &str) -> Result<serde_json::Value, SessionError>;

    async fn resend_verification(&self, email: &str) -> Result<serde_json::Value, SessionError>;

    /// Resolve the user a bearer token belongs to.
    async fn current_user(&self, token: &str) -> Result<User, SessionError>;
}

pub struct AuthClient {
    client: Client,
    settings: AuthServiceSettings,
}

impl AuthClient {
    pub fn new(settings: AuthServiceSettings) -> Result<Self, SessionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self { client, settings })
    }

    pub fn base_url(&self) -> &str {
        &self.settings.url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.url.trim_end_matches('/'), path)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, SessionError> {
        let url = self.url(path);
        self.execute(&url, self.client.traced_post(&url).json(body))
            .await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        url: &str,
        request: TracedRequest,
    ) -> Result<T, SessionError> {
        let (request_id, response) = request.send().await.map_err(|e| {
            tracing::error!("Failed to send request to {}: {}", url, e);
            SessionError::Network(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(
            request_id = %request_id,
            url = %url,
            status = %status,
            "Auth backend response"
        );

        if !status.is_success() {
            return Err(SessionError::from_response(status.as_u16(), &body));
        }

        // An empty success body reads as `null`; callers that need fields
        // still fail to deserialize it.
        let parsed = if body.trim().is_empty() {
            serde_json::from_value(serde_json::Value::Null)
        } else {
            serde_json::from_str(&body)
        };

        parsed.map_err(|e| {
            tracing::error!(request_id = %request_id, "Unexpected body from {}: {}", url, e);
            SessionError::MalformedResponse(e.to_string())
        })
    }
}

#[async_trait]
impl AuthBackend for AuthClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, SessionError> {
        let response: LoginResponse = self.post("/auth/login", &credentials.to_request()).await?;

        if response.token.is_empty() {
            return Err(SessionError::MalformedResponse(
                "login response carried an empty token".to_string(),
            ));
        }

        Ok(response)
    }

    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<serde_json::Value, SessionError> {
        self.post("/auth/register", &registration.to_request()).await
    }

    async fn verify_email(&self, token: &str) -> Result<serde_json::Value, SessionError> {
        self.post("/auth/verify-email", &VerifyEmailRequest { token })
            .await
    }

    async fn resend_verification(&self, email: &str) -> Result<serde_json::Value, SessionError> {
        self.post(
            "/auth/resend-verification",
            &ResendVerificationRequest { email },
        )
        .await
    }

    async fn current_user(&self, token: &str) -> Result<User, SessionError> {
        let url = self.url("/auth/me");
        let response: CurrentUserResponse = self
            .execute(&url, self.client.traced_get(&url).bearer_auth(token))
            .await?;

        Ok(response.into_user())
    }
}
