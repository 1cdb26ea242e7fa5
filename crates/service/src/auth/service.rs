use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{error, info, instrument, warn};

use super::errors::AuthError;
use super::hasher::{CredentialHasher, HashError};
use super::repository::{RegistryError, UserProvider, UserSaver};
use super::token::TokenIssuer;

/// Framework-facing view of the auth workflows.
///
/// Object safe so the HTTP layer can hold an `Arc<dyn Authenticator>` without
/// naming the storage types.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn register_new_user(&self, email: &str, password: &str) -> Result<i64, AuthError>;
    async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String, AuthError>;
}

/// Auth business service independent of web framework
pub struct AuthService<S: UserSaver, P: UserProvider> {
    saver: Arc<S>,
    provider: Arc<P>,
    hasher: CredentialHasher,
    issuer: TokenIssuer,
    token_ttl: Duration,
    /// Hash checked when the email is unknown, so both login failures cost one verify.
    dummy_hash: OnceCell<String>,
}

impl<S: UserSaver, P: UserProvider> AuthService<S, P> {
    pub fn new(
        saver: Arc<S>,
        provider: Arc<P>,
        hasher: CredentialHasher,
        issuer: TokenIssuer,
        token_ttl: Duration,
    ) -> Self {
        Self { saver, provider, hasher, issuer, token_ttl, dummy_hash: OnceCell::new() }
    }

    /// Register a new user and return the id the registry assigned.
    ///
    /// # Examples
    /// ```
    /// use std::{sync::Arc, time::Duration};
    /// use service::auth::{AuthService, CredentialHasher, HashParams, SigningSecret, TokenIssuer};
    /// use service::auth::repository::mock::MockUserRegistry;
    /// let repo = Arc::new(MockUserRegistry::default());
    /// let hasher = CredentialHasher::new(HashParams { memory_kib: 1024, iterations: 1, parallelism: 1 }).unwrap();
    /// let issuer = TokenIssuer::new(&SigningSecret::new("secret"));
    /// let svc = AuthService::new(repo.clone(), repo, hasher, issuer, Duration::from_secs(3600));
    /// let id = tokio_test::block_on(svc.register_new_user("user@example.com", "Secret123")).unwrap();
    /// assert_eq!(id, 1);
    /// ```
    #[instrument(skip(self, password), fields(op = "auth.register_new_user", email = %email))]
    pub async fn register_new_user(&self, email: &str, password: &str) -> Result<i64, AuthError> {
        const OP: &str = "auth.register_new_user";

        info!("registering user");

        let pass_hash = self.hash(password).await.map_err(|e| {
            error!(error = %e, "failed to generate password hash");
            AuthError::internal(OP, e)
        })?;

        let id = match self.saver.save_user(email, &pass_hash).await {
            Ok(id) => id,
            Err(RegistryError::DuplicateUser) => {
                warn!("user already exists");
                return Err(AuthError::UserExists);
            }
            Err(e) => {
                error!(error = %e, "failed to save user");
                return Err(AuthError::internal(OP, e));
            }
        };

        info!(user_id = id, "user registered");
        Ok(id)
    }

    /// Check credentials and issue a token scoped to `app_id`.
    ///
    /// Unknown email and wrong password both end in
    /// [`AuthError::InvalidCredentials`] so callers cannot probe which
    /// addresses are registered.
    #[instrument(skip(self, password), fields(op = "auth.login", email = %email))]
    pub async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String, AuthError> {
        const OP: &str = "auth.login";

        info!("attempting to login user");

        let user = match self.provider.user_by_email(email).await {
            Ok(user) => user,
            Err(RegistryError::UserNotFound) => {
                warn!("user not found");
                self.burn_verify(password).await;
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "failed to get user");
                return Err(AuthError::internal(OP, e));
            }
        };

        match self.verify(user.password_hash, password).await {
            Ok(true) => {}
            Ok(false) => {
                info!(user_id = user.id, "invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(user_id = user.id, error = %e, "stored password hash is unusable");
                return Err(AuthError::internal(OP, e));
            }
        }

        let token = self.issuer.issue(user.id, app_id, self.token_ttl).map_err(|e| {
            error!(user_id = user.id, error = %e, "failed to generate token");
            AuthError::internal(OP, e)
        })?;

        info!(user_id = user.id, "user logged in successfully");
        Ok(token)
    }

    /// Run one verify against a throwaway hash and discard the outcome.
    async fn burn_verify(&self, password: &str) {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| self.hash("dummy password for unknown users"))
            .await;
        match dummy {
            Ok(hash) => {
                let _ = self.verify(hash.clone(), password).await;
            }
            Err(e) => warn!(error = %e, "failed to prepare dummy password hash"),
        }
    }

    async fn hash(&self, password: &str) -> Result<String, HashError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| HashError::Hashing(e.to_string()))?
    }

    async fn verify(&self, hash: String, password: &str) -> Result<bool, HashError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&hash, &password))
            .await
            .map_err(|e| HashError::Hashing(e.to_string()))?
    }
}

#[async_trait]
impl<S: UserSaver, P: UserProvider> Authenticator for AuthService<S, P> {
    async fn register_new_user(&self, email: &str, password: &str) -> Result<i64, AuthError> {
        AuthService::register_new_user(self, email, password).await
    }

    async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String, AuthError> {
        AuthService::login(self, email, password, app_id).await
    }
}
