use std::fmt::Display;

use thiserror::Error;

/// Coarse failure category callers are allowed to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateUser,
    InvalidCredentials,
    Internal,
}

/// Business errors for auth workflows
///
/// Only `UserExists` and `InvalidCredentials` are meant to reach an end user.
/// `Internal` keeps the failing operation and the underlying message for the
/// logs; the HTTP layer renders it as a generic failure.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user already exists")]
    UserExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{op}: {detail}")]
    Internal { op: &'static str, detail: String },
}

impl AuthError {
    pub fn internal(op: &'static str, err: impl Display) -> Self {
        AuthError::Internal { op, detail: err.to_string() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserExists => ErrorKind::DuplicateUser,
            AuthError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AuthError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::UserExists => 1002,
            AuthError::InvalidCredentials => 1004,
            AuthError::Internal { .. } => 1200,
        }
    }
}
