use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The only claim the session gate reads. Optional because stored tokens
/// may carry any claim set.
#[derive(Debug, Default, Deserialize)]
pub struct TokenClaims {
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// `Some(true)` when an `exp` claim exists and is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> Option<bool> {
        self.exp.map(|exp| exp <= now.timestamp())
    }
}

/// Decode JWT claims without validating the signature.
///
/// Returns `None` for tokens that are not three-part JWTs with a JSON
/// payload; such tokens are not self-describing and are left to the backend.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;

    serde_json::from_slice(&payload).ok()
}

/// Whether a stored token is known to be expired.
///
/// Opaque tokens and JWTs without `exp` are not known to be expired.
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    decode_claims(token)
        .and_then(|claims| claims.is_expired_at(now))
        .unwrap_or(false)
}
