use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors a handler can answer with.
///
/// The display text is what the client sees in the `error` field of the
/// envelope, so it never carries internal details.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Undecodable body or a failed field check.
    #[error("{0}")]
    BadRequest(String),
    #[error("user already exists")]
    UserExists,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("request timed out")]
    Timeout,
    /// Unexpected failure; the message names the workflow that failed.
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UserExists => StatusCode::CONFLICT,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = common::types::Response::error(self.to_string());
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
