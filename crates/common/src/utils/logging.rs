use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Deployment environment names understood by [`init_logging`].
pub const ENV_LOCAL: &str = "local";
pub const ENV_DEV: &str = "dev";
pub const ENV_PROD: &str = "prod";

/// Initialize tracing subscriber with sensible defaults and stdout writer.
/// - Respects `RUST_LOG` if set
/// - Falls back to `info,tower_http=info,axum=info`
/// - Writes to stdout to improve visibility in environments that hide stderr
pub fn init_logging_default() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,axum=info"));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// Initialize tracing subscriber with JSON structured output.
/// - Respects `RUST_LOG` if set, otherwise uses `default_directives`
/// - Emits structured JSON logs for better machine parsing
/// - Writes to stdout for consistent container logging behavior
pub fn init_logging_json(default_directives: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .json()
        .with_writer(io::stdout)
        .try_init();
}

/// Pick the subscriber flavour for a deployment environment.
///
/// `local` gets compact human output at debug, `dev` JSON at debug and
/// `prod` JSON at info. Unknown names fall back to [`init_logging_default`].
pub fn init_logging(env: &str) {
    match env {
        ENV_LOCAL => {
            let env_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("debug,tower_http=debug,sqlx=warn"));
            let _ = fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .compact()
                .with_writer(io::stdout)
                .try_init();
        }
        ENV_DEV => init_logging_json("debug,sqlx=warn"),
        ENV_PROD => init_logging_json("info"),
        _ => init_logging_default(),
    }
}
