use std::fmt;

use serde::{Deserialize, Serialize};

/// Registration input
#[derive(Clone, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login input
#[derive(Clone, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "appId")]
    pub app_id: i32,
}

impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("app_id", &self.app_id)
            .finish()
    }
}

/// Stored user as seen by the auth core.
///
/// `password_hash` is a PHC string produced by
/// [`CredentialHasher`](super::hasher::CredentialHasher); it never leaves the
/// hasher/registry boundary.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Claims carried by an issued bearer token.
///
/// Timestamps are seconds since the Unix epoch; `exp` is always `iat + ttl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, decimal-encoded.
    pub sub: String,
    pub app_id: i32,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_prints_secrets() {
        let input = LoginInput { email: "a@x.com".into(), password: "pw1".into(), app_id: 5 };
        let rec = UserRecord { id: 1, email: "a@x.com".into(), password_hash: "$argon2id$secret".into() };
        let out = format!("{input:?} {rec:?}");
        assert!(!out.contains("pw1"));
        assert!(!out.contains("$argon2id"));
        assert!(out.contains("a@x.com"));
    }

    #[test]
    fn login_input_uses_camel_case_app_id() {
        let input: LoginInput =
            serde_json::from_str(r#"{"email":"a@x.com","password":"pw","appId":5}"#).unwrap();
        assert_eq!(input.app_id, 5);
    }

    #[test]
    fn claims_subject_parses_back_to_user_id() {
        let c = Claims { sub: "42".into(), app_id: 1, iat: 0, exp: 10 };
        assert_eq!(c.user_id(), Some(42));
    }
}
