use sea_orm::{entity::prelude::*, DatabaseConnection, PaginatorTrait, QueryFilter, Set};

use crate::errors;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(column_type = "Text")]
    pub pass_hash: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Cheap shape check for an email address; not an RFC 5322 parser.
pub fn validate_email(email: &str) -> Result<(), errors::ModelError> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(errors::ModelError::Validation("invalid email".into()));
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(errors::ModelError::Validation("invalid email".into()));
    }
    if email.len() > 255 {
        return Err(errors::ModelError::Validation("email too long".into()));
    }
    Ok(())
}

/// Insert a user row and return its id.
///
/// Uniqueness of `email` is enforced by the database; a collision surfaces as
/// [`errors::ModelError::Duplicate`].
pub async fn create(db: &DatabaseConnection, email: &str, pass_hash: String) -> Result<i64, errors::ModelError> {
    if pass_hash.trim().is_empty() {
        return Err(errors::ModelError::Validation("password hash required".into()));
    }
    let am = ActiveModel {
        email: Set(email.to_string()),
        pass_hash: Set(pass_hash),
        ..Default::default()
    };
    let res = Entity::insert(am).exec(db).await?;
    Ok(res.last_insert_id)
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, errors::ModelError> {
    let found = Entity::find()
        .filter(Column::Email.eq(email))
        .one(db)
        .await?;
    Ok(found)
}

pub async fn count(db: &DatabaseConnection) -> Result<u64, errors::ModelError> {
    Ok(Entity::find().count(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn email_shape() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("a@").is_err());
        assert!(validate_email("a@b@c").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let db = db::connect_in_memory().await.expect("sqlite");
        let a = create(&db, "a@x.com", "h1".into()).await.unwrap();
        let b = create(&db, "b@x.com", "h2".into()).await.unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);

        let found = find_by_email(&db, "b@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, b);
        assert_eq!(found.pass_hash, "h2");
        assert!(find_by_email(&db, "c@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_by_unique_index() {
        let db = db::connect_in_memory().await.expect("sqlite");
        create(&db, "a@x.com", "h1".into()).await.unwrap();
        let err = create(&db, "a@x.com", "h2".into()).await.unwrap_err();
        assert!(matches!(err, errors::ModelError::Duplicate(_)), "got {err:?}");
        assert_eq!(count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_hash_is_rejected() {
        let db = db::connect_in_memory().await.expect("sqlite");
        let err = create(&db, "a@x.com", "  ".into()).await.unwrap_err();
        assert!(matches!(err, errors::ModelError::Validation(_)));
    }
}
