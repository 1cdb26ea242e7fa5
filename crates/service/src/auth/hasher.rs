//! Password hashing and verification (Argon2id, PHC string format).

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("hashing error: {0}")]
    Hashing(String),
    #[error("malformed password hash: {0}")]
    MalformedHash(String),
    #[error("invalid hash parameters: {0}")]
    InvalidParams(String),
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Salted adaptive password hasher.
///
/// Hashing is CPU-bound and deliberately slow; async callers should run it on
/// the blocking pool.
#[derive(Clone)]
pub struct CredentialHasher {
    argon: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new(params: HashParams) -> Result<Self, HashError> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| HashError::InvalidParams(e.to_string()))?;
        Ok(Self { argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) })
    }

    /// Hash `password` with a fresh random salt. Empty passwords are accepted.
    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HashError::Hashing(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// Check `password` against a stored PHC hash.
    ///
    /// A mismatch is `Ok(false)`. The cost parameters embedded in `hash` are
    /// used, so hashes made under older settings keep verifying.
    pub fn verify(&self, hash: &str, password: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash).map_err(|e| HashError::MalformedHash(e.to_string()))?;
        match self.argon.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::MalformedHash(e.to_string())),
        }
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self { argon: Argon2::default() }
    }
}
