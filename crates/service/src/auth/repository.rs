use async_trait::async_trait;
use thiserror::Error;

use super::domain::UserRecord;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("user already exists")]
    DuplicateUser,
    #[error("user not found")]
    UserNotFound,
    #[error("storage error: {0}")]
    Storage(String),
}

/// Persists new users.
///
/// Implementations must make the uniqueness check on `email` atomic with the
/// insert (a unique index, a lock held across check and write); callers never
/// look before they leap.
#[async_trait]
pub trait UserSaver: Send + Sync {
    async fn save_user(&self, email: &str, pass_hash: &str) -> Result<i64, RegistryError>;
}

/// Looks users up for login.
#[async_trait]
pub trait UserProvider: Send + Sync {
    async fn user_by_email(&self, email: &str) -> Result<UserRecord, RegistryError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Inner {
        users: HashMap<String, UserRecord>, // key: email
        last_id: i64,
    }

    /// Ids start at 1 and increase by one per successful save.
    #[derive(Default)]
    pub struct MockUserRegistry {
        inner: Mutex<Inner>,
    }

    impl MockUserRegistry {
        pub fn len(&self) -> usize {
            self.inner.lock().map(|g| g.users.len()).unwrap_or_default()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Overwrite the stored hash for `email`; lets tests plant corrupted data.
        pub fn set_hash(&self, email: &str, pass_hash: &str) -> Result<(), RegistryError> {
            let mut inner = self.inner.lock().map_err(|e| RegistryError::Storage(e.to_string()))?;
            let rec = inner.users.get_mut(email).ok_or(RegistryError::UserNotFound)?;
            rec.password_hash = pass_hash.to_string();
            Ok(())
        }
    }

    #[async_trait]
    impl UserSaver for MockUserRegistry {
        async fn save_user(&self, email: &str, pass_hash: &str) -> Result<i64, RegistryError> {
            let mut inner = self.inner.lock().map_err(|e| RegistryError::Storage(e.to_string()))?;
            if inner.users.contains_key(email) {
                return Err(RegistryError::DuplicateUser);
            }
            inner.last_id += 1;
            let id = inner.last_id;
            let rec = UserRecord { id, email: email.to_string(), password_hash: pass_hash.to_string() };
            inner.users.insert(email.to_string(), rec);
            Ok(id)
        }
    }

    #[async_trait]
    impl UserProvider for MockUserRegistry {
        async fn user_by_email(&self, email: &str) -> Result<UserRecord, RegistryError> {
            let inner = self.inner.lock().map_err(|e| RegistryError::Storage(e.to_string()))?;
            inner.users.get(email).cloned().ok_or(RegistryError::UserNotFound)
        }
    }

}
