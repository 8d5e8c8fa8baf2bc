use thiserror::Error;

/// Error code the auth backend uses for expired verification/session tokens.
pub const TOKEN_EXPIRED_CODE: &str = "TOKEN_EXPIRED";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("Failed to encode stored value: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Every failure a session operation hands back to the calling view.
///
/// `Display` is the human-readable message; the variants let callers branch
/// where a view needs to (e.g. offering "resend link" on `TokenExpired`).
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("{message}")]
    TokenExpired { message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Superseded by a newer session operation")]
    Superseded,
}

impl SessionError {
    /// Build the error for a non-2xx collaborator response.
    ///
    /// The message comes from the body's `message` (or `error`) field when the
    /// body is JSON, otherwise a generic status-code message.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let message = field("message")
            .or_else(|| field("error"))
            .unwrap_or_else(|| format!("Request failed with status code {}", status));
        let code = field("code");

        if code.as_deref() == Some(TOKEN_EXPIRED_CODE) {
            return SessionError::TokenExpired { message };
        }

        SessionError::Rejected {
            status,
            message,
            code,
        }
    }

    /// HTTP status of a rejected request, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SessionError::Rejected { status, .. } => Some(*status),
            SessionError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the backend said the credentials/token are not acceptable.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
            || matches!(self, SessionError::TokenExpired { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_taken_from_body() {
        let err = SessionError::from_response(401, r#"{"message":"Invalid email or password"}"#);
        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_error_field_used_when_message_missing() {
        let err = SessionError::from_response(409, r#"{"error":"Email already registered"}"#);
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[test]
    fn test_generic_message_for_unparseable_body() {
        let err = SessionError::from_response(502, "<html>Bad Gateway</html>");
        assert_eq!(err.to_string(), "Request failed with status code 502");
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_token_expired_code_is_discriminated() {
        let err = SessionError::from_response(
            400,
            r#"{"message":"Verification link expired","code":"TOKEN_EXPIRED"}"#,
        );
        assert!(matches!(err, SessionError::TokenExpired { .. }));
        assert_eq!(err.to_string(), "Verification link expired");
    }

    #[test]
    fn test_other_codes_are_kept() {
        let err = SessionError::from_response(
            403,
            r#"{"message":"Verify your email","code":"EMAIL_NOT_VERIFIED"}"#,
        );
        match err {
            SessionError::Rejected { code, .. } => {
                assert_eq!(code.as_deref(), Some("EMAIL_NOT_VERIFIED"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
