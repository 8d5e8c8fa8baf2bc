use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::models::User;

/// Email/password pair submitted by the login form.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: Secret<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Secret::new(password.into()),
        }
    }

    pub(crate) fn to_request(&self) -> LoginRequest<'_> {
        LoginRequest {
            email: &self.email,
            password: self.password.expose_secret(),
        }
    }
}

/// Fields collected by the registration flow.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: Secret<String>,
    pub phone: Option<String>,
}

impl Registration {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password: Secret::new(password.into()),
            phone: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub(crate) fn to_request(&self) -> RegisterRequest<'_> {
        RegisterRequest {
            first_name: &self.first_name,
            last_name: &self.last_name,
            email: &self.email,
            password: self.password.expose_secret(),
            phone: self.phone.as_deref(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
}

#[derive(Serialize)]
pub(crate) struct VerifyEmailRequest<'a> {
    pub token: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ResendVerificationRequest<'a> {
    pub email: &'a str,
}

/// Successful `POST /auth/login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// `GET /auth/me` answers either the bare user or `{ "user": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum CurrentUserResponse {
    Wrapped { user: User },
    Bare(User),
}

impl CurrentUserResponse {
    pub fn into_user(self) -> User {
        match self {
            CurrentUserResponse::Wrapped { user } => user,
            CurrentUserResponse::Bare(user) => user,
        }
    }
}
