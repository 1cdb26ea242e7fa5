//! Auth module: three-layer architecture (domain, repository, service).
//!
//! This module centralizes registration and login business logic under the service crate.
//! The password hasher and the token issuer are leaf components the service composes.

pub mod domain;
pub mod errors;
pub mod hasher;
pub mod token;
pub mod repository;
pub mod service;
pub mod repo;

pub use errors::{AuthError, ErrorKind};
pub use hasher::{CredentialHasher, HashError, HashParams};
pub use repository::{RegistryError, UserProvider, UserSaver};
pub use service::{AuthService, Authenticator};
pub use token::{SigningSecret, TokenError, TokenIssuer};
