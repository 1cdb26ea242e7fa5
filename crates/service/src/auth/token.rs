//! Bearer token issuance (HS256 JWT).
//!
//! Only issuing lives here. Tokens are checked by whoever consumes them;
//! this crate has no verify/parse path.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use thiserror::Error;

use super::domain::Claims;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing error: {0}")]
    Signing(String),
}

/// Symmetric key material used to sign tokens.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SigningSecret {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    header: Header,
}

impl TokenIssuer {
    pub fn new(secret: &SigningSecret) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            header: Header::new(Algorithm::HS256),
        }
    }

    /// Mint a token for `user_id` within `app_id`, valid for `ttl` from now.
    pub fn issue(&self, user_id: i64, app_id: i32, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(user_id, app_id, ttl, Utc::now())
    }

    /// Same as [`issue`](Self::issue) with an explicit clock reading.
    pub fn issue_at(&self, user_id: i64, app_id: i32, ttl: Duration, now: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|ttl| iat.checked_add(ttl))
            .ok_or_else(|| TokenError::Signing(format!("token ttl {ttl:?} out of range")))?;
        let claims = Claims { sub: user_id.to_string(), app_id, iat, exp };
        encode(&self.header, &claims, &self.key).map_err(|e| TokenError::Signing(e.to_string()))
    }
}
