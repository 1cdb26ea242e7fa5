use std::{
    future::IntoFuture,
    net::{IpAddr, SocketAddr, ToSocketAddrs},
    sync::Arc,
};

use axum::Router;
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use configs::{AppConfig, AuthConfig, ServerConfig};
use sea_orm::DatabaseConnection;
use service::auth::{
    repo::seaorm::SeaOrmUserRegistry, AuthService, Authenticator, CredentialHasher, HashParams,
    SigningSecret, TokenIssuer,
};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Accepts IPv4, bare or bracketed IPv6, and resolvable host names.
fn load_bind_addr(cfg: &ServerConfig) -> anyhow::Result<SocketAddr> {
    let host = cfg.host.trim().trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, cfg.port));
    }
    (host, cfg.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| anyhow::anyhow!("server.host {host:?} did not resolve to an address"))
}

/// Wire the hasher, token issuer and SQL-backed registry into one authenticator.
pub fn build_auth(cfg: &AuthConfig, db: DatabaseConnection) -> Result<Arc<dyn Authenticator>, StartupError> {
    let secret = SigningSecret::from(cfg.token_secret.clone());
    if secret.is_empty() {
        return Err(StartupError::InvalidConfig("auth.token_secret is empty".into()));
    }

    let hasher = CredentialHasher::new(HashParams {
        memory_kib: cfg.hash_memory_kib,
        iterations: cfg.hash_iterations,
        parallelism: cfg.hash_parallelism,
    })
    .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;

    let registry = Arc::new(SeaOrmUserRegistry::new(db));
    let svc = AuthService::new(
        registry.clone(),
        registry,
        hasher,
        TokenIssuer::new(&secret),
        cfg.token_ttl(),
    );
    Ok(Arc::new(svc))
}

/// Open storage, apply migrations and assemble the handler state.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    common::env::ensure_storage_dir(&cfg.database.url).await?;
    let db = models::db::connect(&cfg.database).await?;
    models::db::migrate(&db).await?;
    info!(event = "storage_ready", "database connected and migrated");

    let auth = build_auth(&cfg.auth, db)?;
    Ok(ServerState { auth })
}

pub fn build_app(cfg: &AppConfig, state: ServerState) -> Router {
    routes::build_router(state, build_cors(), cfg.server.request_timeout())
}

/// Resolves with the name of the signal that asked us to stop.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

/// Public entry: build the app and run the HTTP server until a stop signal
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app = build_app(&cfg, state);

    let addr = load_bind_addr(&cfg.server)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(event = "listening", %addr, env = %cfg.env, "starting server");

    let stop = Arc::new(Notify::new());
    let server = axum::serve(listener, app)
        .with_graceful_shutdown({
            let stop = Arc::clone(&stop);
            async move { stop.notified().await }
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        res = &mut server => {
            res?;
            return Ok(());
        }
        signal = shutdown_signal() => {
            info!(event = "shutdown_signal", signal, "stopping server");
            stop.notify_one();
        }
    }

    // 在途请求最多再等 shutdown_timeout，超时直接退出
    let grace = cfg.server.shutdown_timeout();
    match tokio::time::timeout(grace, server).await {
        Ok(res) => {
            res?;
            info!(event = "stop", "server stopped");
        }
        Err(_) => warn!(event = "stop", timeout = ?grace, "graceful shutdown timed out, dropping open connections"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_from_config() {
        let cfg = ServerConfig { host: "127.0.0.1".into(), port: 8082, ..ServerConfig::default() };
        assert_eq!(load_bind_addr(&cfg).unwrap().port(), 8082);

        let bad = ServerConfig { host: "not a host".into(), ..cfg.clone() };
        assert!(load_bind_addr(&bad).is_err());
    }

    #[test]
    fn bind_addr_accepts_ipv6_hosts() {
        for host in ["::1", "[::1]"] {
            let cfg = ServerConfig { host: host.into(), port: 8082, ..ServerConfig::default() };
            let addr = load_bind_addr(&cfg).unwrap();
            assert!(addr.is_ipv6(), "{host} -> {addr}");
            assert_eq!(addr.to_string(), "[::1]:8082");
        }
    }

    #[tokio::test]
    async fn empty_secret_is_rejected() {
        let db = models::db::connect_in_memory().await.unwrap();
        let cfg = AuthConfig { token_secret: String::new(), ..AuthConfig::default() };
        assert!(matches!(build_auth(&cfg, db), Err(StartupError::InvalidConfig(_))));
    }
}
