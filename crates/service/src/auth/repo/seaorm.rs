use chrono::Utc;
use sea_orm::DatabaseConnection;
use sea_orm::EntityTrait;
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::auth::domain::{AdminOverride, AuthUser, Credentials, Role};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;
use models::{user, user_credentials};

const ADMIN_OVERRIDE_ALGORITHM: &str = "argon2";

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(u: user::Model) -> Result<AuthUser, AuthError> {
    let role = Role::parse(&u.role)
        .ok_or_else(|| AuthError::Repository(format!("unknown role {:?} for user {}", u.role, u.id)))?;
    Ok(AuthUser {
        id: u.id,
        username: u.username,
        display_name: u.display_name,
        role,
        rw: u.rw,
        created_at: u.created_at.with_timezone(&Utc),
        password_changed: u.password_changed,
        password_changed_at: u.password_changed_at.map(|t| t.with_timezone(&Utc)),
    })
}

fn to_credentials(c: user_credentials::Model) -> Credentials {
    Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_users_by_username(&self, username: &str) -> Result<Vec<AuthUser>, AuthError> {
        user::find_by_username(&self.db, username)
            .await?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let found = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        found.map(to_domain).transpose()
    }

    async fn create_user(&self, username: &str, display_name: &str, rw: Option<&str>) -> Result<AuthUser, AuthError> {
        let created = user::create(&self.db, username, display_name, rw).await?;
        to_domain(created)
    }

    async fn create_user_with_password(
        &self,
        username: &str,
        display_name: &str,
        rw: Option<&str>,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, AuthError> {
        let txn = self.db.begin().await.map_err(|e| AuthError::Repository(e.to_string()))?;
        let created = user::create(&txn, username, display_name, rw).await?;
        user_credentials::upsert_password(&txn, created.id, password_hash, &password_algorithm).await?;
        txn.commit().await.map_err(|e| AuthError::Repository(e.to_string()))?;
        to_domain(created)
    }

    async fn list_users_in_rw(&self, rw: &str) -> Result<Vec<AuthUser>, AuthError> {
        user::list_by_rw(&self.db, rw).await?.into_iter().map(to_domain).collect()
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        Ok(user_credentials::find_by_user(&self.db, user_id).await?.map(to_credentials))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm).await?;
        Ok(to_credentials(c))
    }

    async fn mark_password_changed(&self, user_id: Uuid) -> Result<(), AuthError> {
        user::mark_password_changed(&self.db, user_id).await?;
        Ok(())
    }

    // Admin overrides share the credentials table, keyed by the fixed admin id.
    async fn get_admin_override(&self, admin_id: Uuid) -> Result<Option<AdminOverride>, AuthError> {
        let found = user_credentials::find_by_user(&self.db, admin_id).await?;
        Ok(found.map(|c| AdminOverride { password_hash: c.password_hash, changed_at: c.updated_at.with_timezone(&Utc) }))
    }

    async fn set_admin_override(&self, admin_id: Uuid, password_hash: String) -> Result<AdminOverride, AuthError> {
        let c = user_credentials::upsert_password(&self.db, admin_id, password_hash, ADMIN_OVERRIDE_ALGORITHM).await?;
        Ok(AdminOverride { password_hash: c.password_hash, changed_at: c.updated_at.with_timezone(&Utc) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::{Role, ADMIN_ACCOUNTS};
    use crate::test_support::get_db;

    fn unique(prefix: &str) -> String {
        format!("{prefix}_{}", Uuid::new_v4().simple())
    }

    #[tokio::test]
    async fn user_and_credentials_round_trip() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmAuthRepository::new(db);
        let username = unique("budi");
        let rw = unique("rw");

        let u = repo.create_user(&username, "Budi", Some(&rw)).await?;
        assert_eq!(u.role, Role::User);
        assert_eq!(repo.find_users_by_username(&username).await?.len(), 1);
        assert_eq!(repo.list_users_in_rw(&rw).await?.len(), 1);

        repo.upsert_password(u.id, "$argon2id$one".into(), "argon2".into()).await?;
        repo.upsert_password(u.id, "$argon2id$two".into(), "argon2".into()).await?;
        assert_eq!(repo.get_credentials(u.id).await?.map(|c| c.password_hash).as_deref(), Some("$argon2id$two"));

        repo.mark_password_changed(u.id).await?;
        assert!(repo.get_user(u.id).await?.is_some_and(|u| u.password_changed));
        Ok(())
    }

    #[tokio::test]
    async fn admin_override_is_stored_by_admin_id() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmAuthRepository::new(db);
        let admin = ADMIN_ACCOUNTS[1].id;
        let hash = format!("$argon2id${}", Uuid::new_v4().simple());
        repo.set_admin_override(admin, hash.clone()).await?;
        assert_eq!(repo.get_admin_override(admin).await?.map(|o| o.password_hash), Some(hash));
        Ok(())
    }

    #[tokio::test]
    async fn failed_credential_write_rolls_back_the_user() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmAuthRepository::new(db);
        let username = unique("sari");

        // an empty hash is rejected after the user row is inserted
        let res = repo.create_user_with_password(&username, "Sari", None, String::new(), "argon2".into()).await;
        assert!(matches!(res, Err(AuthError::Validation(_))));
        assert!(repo.find_users_by_username(&username).await?.is_empty());

        let u = repo
            .create_user_with_password(&username, "Sari", None, "$argon2id$ok".into(), "argon2".into())
            .await?;
        assert_eq!(repo.get_credentials(u.id).await?.map(|c| c.password_hash).as_deref(), Some("$argon2id$ok"));
        Ok(())
    }
}
