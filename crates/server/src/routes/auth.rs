use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info, instrument, warn};

use common::types::Response;
use service::auth::{
    domain::{LoginInput, RegisterInput},
    Authenticator, ErrorKind,
};

use crate::errors::ApiError;

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<dyn Authenticator>,
}

#[derive(Serialize)]
pub struct RegisterOutput {
    #[serde(flatten)]
    pub response: Response,
    pub user_id: i64,
}

#[derive(Serialize)]
pub struct LoginOutput {
    #[serde(flatten)]
    pub response: Response,
    pub token: String,
}

/// Decode a JSON body, telling an empty body apart from a malformed one.
fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        error!("request body is empty");
        return Err(ApiError::BadRequest("empty request".into()));
    }
    serde_json::from_slice(body).map_err(|e| {
        error!(error = %e, "failed to decode request body");
        ApiError::BadRequest("failed to decode request".into())
    })
}

fn required(field: &str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("field {field} is a required field")));
    }
    Ok(())
}

fn validate_credentials(email: &str, password: &str) -> Result<(), ApiError> {
    required("email", email)?;
    if models::user::validate_email(email).is_err() {
        return Err(ApiError::BadRequest("field email is not a valid email".into()));
    }
    required("password", password)
}

fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[instrument(skip_all, fields(op = "handlers.auth.signup", request_id = %request_id(&headers)))]
pub async fn signup(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RegisterOutput>, ApiError> {
    let input: RegisterInput = decode(&body)?;
    info!(?input, "request body decoded");

    if let Err(e) = validate_credentials(&input.email, &input.password) {
        error!(error = %e, "invalid request");
        return Err(e);
    }

    match state.auth.register_new_user(&input.email, &input.password).await {
        Ok(user_id) => {
            info!(user_id, "user registered");
            Ok(Json(RegisterOutput { response: Response::ok(), user_id }))
        }
        Err(e) if e.kind() == ErrorKind::DuplicateUser => {
            warn!(email = %input.email, code = e.code(), "user already exists");
            Err(ApiError::UserExists)
        }
        Err(e) => {
            error!(error = %e, code = e.code(), "failed to save user");
            Err(ApiError::Internal("failed to save user"))
        }
    }
}

#[instrument(skip_all, fields(op = "handlers.auth.signin", request_id = %request_id(&headers)))]
pub async fn signin(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<LoginOutput>, ApiError> {
    let input: LoginInput = decode(&body)?;
    info!(?input, "request body decoded");

    let checked = validate_credentials(&input.email, &input.password).and_then(|_| {
        if input.app_id == 0 {
            return Err(ApiError::BadRequest("field appId is a required field".into()));
        }
        Ok(())
    });
    if let Err(e) = checked {
        error!(error = %e, "invalid request");
        return Err(e);
    }

    match state.auth.login(&input.email, &input.password, input.app_id).await {
        Ok(token) => {
            info!(app_id = input.app_id, "user logged in");
            Ok(Json(LoginOutput { response: Response::ok(), token }))
        }
        Err(e) if e.kind() == ErrorKind::InvalidCredentials => {
            warn!(email = %input.email, code = e.code(), "invalid email or password");
            Err(ApiError::InvalidCredentials)
        }
        Err(e) => {
            error!(error = %e, code = e.code(), "failed to login");
            Err(ApiError::Internal("failed to login"))
        }
    }
}
