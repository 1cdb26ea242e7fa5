//! Service layer holding the authentication core.
//! - Separates business logic from HTTP and storage.
//! - Storage is reached only through the `UserSaver` / `UserProvider` traits.
//! - Provides clear error types and documented interfaces.

pub mod auth;
