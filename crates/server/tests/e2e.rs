//! Full stack: config, SQLite storage with migrations, router.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use configs::AppConfig;
use server::startup::{build_app, build_state};

fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.database.url = "sqlite::memory:".into();
    cfg.database.max_connections = 1;
    cfg.database.min_connections = 1;
    cfg.auth.token_secret = "e2e-secret".into();
    cfg.auth.hash_memory_kib = 1024;
    cfg.auth.hash_iterations = 1;
    cfg
}

async fn call(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn signup_signin_against_sqlite() -> anyhow::Result<()> {
    let mut cfg = test_config();
    cfg.normalize_and_validate()?;
    let state = build_state(&cfg).await?;
    let app = build_app(&cfg, state);

    let (status, body) = call(&app, "/signup", json!({"email": "a@x.com", "password": "pw1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], 1);

    let (status, _) = call(&app, "/signup", json!({"email": "a@x.com", "password": "pw2"})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(&app, "/signup", json!({"email": "b@x.com", "password": "pw2"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], 2);

    let (status, body) = call(&app, "/signin", json!({"email": "a@x.com", "password": "pw1", "appId": 3})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| t.split('.').count() == 3));

    let (status, _) = call(&app, "/signin", json!({"email": "a@x.com", "password": "pw2", "appId": 3})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn startup_rejects_missing_secret() {
    let mut cfg = test_config();
    cfg.auth.token_secret.clear();
    assert!(build_state(&cfg).await.is_err());
}
