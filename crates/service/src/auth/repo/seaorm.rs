use sea_orm::DatabaseConnection;

use models::errors::ModelError;

use crate::auth::domain::UserRecord;
use crate::auth::repository::{RegistryError, UserProvider, UserSaver};

/// `users` table backed registry. Email uniqueness comes from the
/// `uniq_users_email` index, so concurrent saves of one address cannot both win.
#[derive(Clone)]
pub struct SeaOrmUserRegistry {
    pub db: DatabaseConnection,
}

impl SeaOrmUserRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn storage(e: ModelError) -> RegistryError {
    RegistryError::Storage(e.to_string())
}

#[async_trait::async_trait]
impl UserSaver for SeaOrmUserRegistry {
    async fn save_user(&self, email: &str, pass_hash: &str) -> Result<i64, RegistryError> {
        match models::user::create(&self.db, email, pass_hash.to_string()).await {
            Ok(id) => Ok(id),
            Err(ModelError::Duplicate(_)) => Err(RegistryError::DuplicateUser),
            Err(e) => Err(storage(e)),
        }
    }
}

#[async_trait::async_trait]
impl UserProvider for SeaOrmUserRegistry {
    async fn user_by_email(&self, email: &str) -> Result<UserRecord, RegistryError> {
        let found = models::user::find_by_email(&self.db, email).await.map_err(storage)?;
        found
            .map(|u| UserRecord { id: u.id, email: u.email, password_hash: u.pass_hash })
            .ok_or(RegistryError::UserNotFound)
    }
}
