use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

pub const ENV_LOCAL: &str = "local";
pub const ENV_DEV: &str = "dev";
pub const ENV_PROD: &str = "prod";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: default_env(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8082,
            worker_threads: Some(4),
            timeout_secs: default_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

/// Settings consumed by the authentication core.
///
/// `token_secret` is the HS256 signing key. It is read once at startup and
/// never changes while the process runs.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    #[serde(default)]
    pub token_secret: String,
    #[serde(default = "default_hash_memory")]
    pub hash_memory_kib: u32,
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
    #[serde(default = "default_hash_parallelism")]
    pub hash_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl(),
            token_secret: String::new(),
            hash_memory_kib: default_hash_memory(),
            hash_iterations: default_hash_iterations(),
            hash_parallelism: default_hash_parallelism(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("token_secret", &"<redacted>")
            .field("hash_memory_kib", &self.hash_memory_kib)
            .field("hash_iterations", &self.hash_iterations)
            .field("hash_parallelism", &self.hash_parallelism)
            .finish()
    }
}

fn default_env() -> String { ENV_LOCAL.to_string() }
fn default_timeout() -> u64 { 4 }
fn default_shutdown_timeout() -> u64 { 10 }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 30 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_token_ttl() -> u64 { 3600 }
// argon2 crate defaults (OWASP baseline): 19 MiB, 2 passes, 1 lane
fn default_hash_memory() -> u32 { 19 * 1024 }
fn default_hash_iterations() -> u32 { 2 }
fn default_hash_parallelism() -> u32 { 1 }

pub const DEFAULT_DATABASE_URL: &str = "sqlite://storage/storage.db?mode=rwc";

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("cannot read config file {path}: {e}"))?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.apply_overrides(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Fill values from the environment (`DATABASE_URL`, `AUTH_TOKEN_SECRET`)
    /// when the file leaves them empty.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // 若 TOML 中未提供，则尝试从环境变量填充
        if self.database.url.trim().is_empty() {
            if let Some(url) = lookup("DATABASE_URL") {
                self.database.url = url;
            }
        }
        if self.auth.token_secret.is_empty() {
            if let Some(secret) = lookup("AUTH_TOKEN_SECRET") {
                self.auth.token_secret = secret;
            }
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        let env = self.env.trim().to_lowercase();
        if ![ENV_LOCAL, ENV_DEV, ENV_PROD].contains(&env.as_str()) {
            return Err(anyhow!("env must be one of local, dev, prod (got {:?})", self.env));
        }
        self.env = env;
        self.server.normalize()?;
        self.database.normalize();
        self.database.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("server.timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl DatabaseConfig {
    pub fn normalize(&mut self) {
        if self.url.trim().is_empty() {
            self.url = DEFAULT_DATABASE_URL.to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("sqlite:")
            || lower.starts_with("postgresql://")
            || lower.starts_with("postgres://"))
        {
            return Err(anyhow!("database.url must start with sqlite:, postgres:// or postgresql://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive numbers of seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.token_secret.is_empty() {
            return Err(anyhow!("auth.token_secret is empty; set it in the config file or AUTH_TOKEN_SECRET"));
        }
        if self.token_ttl_secs == 0 {
            return Err(anyhow!("auth.token_ttl_secs must be > 0"));
        }
        if self.hash_iterations == 0 || self.hash_parallelism == 0 {
            return Err(anyhow!("auth.hash_iterations and auth.hash_parallelism must be >= 1"));
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        env = "dev"

        [server]
        host = "0.0.0.0"
        port = 9000
        timeout_secs = 5

        [database]
        url = "postgres://u:p@localhost:5432/auth"

        [auth]
        token_ttl_secs = 900
        token_secret = "s3cr3t"
    "#;

    #[test]
    fn parses_full_file() {
        let mut cfg = load_from_str(SAMPLE).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.env, ENV_DEV);
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.server.request_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.auth.token_ttl(), Duration::from_secs(900));
        assert_eq!(cfg.auth.hash_memory_kib, 19 * 1024);
        assert_eq!(cfg.database.max_connections, 10);
    }

    #[test]
    fn empty_file_uses_defaults_but_needs_secret() {
        let mut cfg = load_from_str("").unwrap();
        let err = cfg.normalize_and_validate().unwrap_err();
        assert!(err.to_string().contains("token_secret"));

        cfg.apply_overrides(|k| (k == "AUTH_TOKEN_SECRET").then(|| "from-env".to_string()));
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.auth.token_secret, "from-env");
        assert_eq!(cfg.database.url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.env, ENV_LOCAL);
    }

    #[test]
    fn file_values_win_over_environment() {
        let mut cfg = load_from_str(SAMPLE).unwrap();
        cfg.apply_overrides(|_| Some("ignored".to_string()));
        assert_eq!(cfg.auth.token_secret, "s3cr3t");
        assert_eq!(cfg.database.url, "postgres://u:p@localhost:5432/auth");
    }

    #[test]
    fn rejects_unknown_env_and_bad_url() {
        let mut cfg = load_from_str("env = \"staging\"\n[auth]\ntoken_secret = \"x\"").unwrap();
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = load_from_str("[database]\nurl = \"mysql://x\"\n[auth]\ntoken_secret = \"x\"").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn debug_redacts_secret() {
        let cfg = load_from_str(SAMPLE).unwrap();
        let dbg = format!("{:?}", cfg.auth);
        assert!(!dbg.contains("s3cr3t"));
        assert!(dbg.contains("<redacted>"));
    }
}
