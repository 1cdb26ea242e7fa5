pub mod auth;

use std::time::Duration;

use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    http::Request,
    routing::{get, post},
    Json, Router,
};
use tower::{timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, Level};

use common::types::Health;

use self::auth::ServerState;
use crate::errors::ApiError;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn index() -> &'static str {
    "welcome anonymous"
}

/// Turn middleware failures into the JSON error envelope.
async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return ApiError::Timeout;
    }
    error!(error = %err, "unhandled middleware error");
    ApiError::Internal("internal error")
}

/// Span per request carrying method, path and the request id set upstream.
fn make_span(req: &Request<Body>) -> tracing::Span {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    tracing::info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        request_id = %request_id,
    )
}

/// Build the application router with the auth routes and shared middleware
pub fn build_router(state: ServerState, cors: CorsLayer, request_timeout: Duration) -> Router {
    let public = Router::new()
        .route("/", get(index))
        .route("/health", get(health));

    let auth = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin));

    // 请求 ID 必须在 TraceLayer 之前生成，span 里才能带上
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(cors)
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .layer(TimeoutLayer::new(request_timeout));

    public
        .merge(auth)
        .with_state(state)
        .layer(middleware)
}
