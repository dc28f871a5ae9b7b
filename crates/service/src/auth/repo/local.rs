use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::domain::{AdminOverride, AuthUser, Credentials, Role};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;
use crate::storage::kv::{self, KeyValueStore};
use crate::storage::{ADMIN_PASSWORDS_KEY, USERS_KEY};

/// Registry entry as stored under `registered_users`; the password hash
/// lives alongside the profile fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredUser {
    id: Uuid,
    username: String,
    #[serde(default)]
    display_name: String,
    #[serde(default = "default_role")]
    role: Role,
    #[serde(default)]
    rw: Option<String>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    password_changed: bool,
    #[serde(default)]
    password_changed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    password_hash: Option<String>,
    #[serde(default)]
    password_algorithm: Option<String>,
}

fn default_role() -> Role {
    Role::User
}

impl StoredUser {
    fn to_domain(&self) -> AuthUser {
        AuthUser {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            rw: self.rw.clone(),
            created_at: self.created_at,
            password_changed: self.password_changed,
            password_changed_at: self.password_changed_at,
        }
    }

    fn credentials(&self) -> Option<Credentials> {
        let hash = self.password_hash.clone()?;
        Some(Credentials {
            user_id: self.id,
            password_hash: hash,
            password_algorithm: self.password_algorithm.clone().unwrap_or_else(|| "argon2".into()),
        })
    }
}

/// Auth repository over the local key/value store.
pub struct LocalAuthRepository {
    store: Arc<dyn KeyValueStore>,
}

impl LocalAuthRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn users(&self) -> Result<Vec<StoredUser>, AuthError> {
        Ok(kv::load::<Vec<StoredUser>>(self.store.as_ref(), USERS_KEY).await?.unwrap_or_default())
    }

    async fn modify_user<R, F>(&self, user_id: Uuid, f: F) -> Result<R, AuthError>
    where
        R: Send,
        F: FnOnce(&mut StoredUser) -> R + Send,
    {
        let out = kv::modify(self.store.as_ref(), USERS_KEY, |users: &mut Vec<StoredUser>| {
            Ok(users.iter_mut().find(|u| u.id == user_id).map(f))
        })
        .await?;
        out.ok_or(AuthError::NotFound)
    }

    /// Append one registry entry; the hash, when given, is written in the same store update.
    async fn insert_user(
        &self,
        username: &str,
        display_name: &str,
        rw: Option<&str>,
        credential: Option<(String, String)>,
    ) -> Result<AuthUser, AuthError> {
        models::user::validate_username(username)?;
        models::user::validate_display_name(display_name)?;
        let (password_hash, password_algorithm) = credential.unzip();
        let entry = StoredUser {
            id: Uuid::new_v4(),
            username: username.to_string(),
            display_name: display_name.to_string(),
            role: Role::User,
            rw: rw.map(str::to_string),
            created_at: Utc::now(),
            password_changed: false,
            password_changed_at: None,
            password_hash,
            password_algorithm,
        };
        let user = entry.to_domain();
        kv::modify(self.store.as_ref(), USERS_KEY, move |users: &mut Vec<StoredUser>| {
            users.push(entry);
            Ok(())
        })
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl AuthRepository for LocalAuthRepository {
    async fn find_users_by_username(&self, username: &str) -> Result<Vec<AuthUser>, AuthError> {
        Ok(self
            .users()
            .await?
            .iter()
            .filter(|u| u.username == username)
            .map(StoredUser::to_domain)
            .collect())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        Ok(self.users().await?.iter().find(|u| u.id == id).map(StoredUser::to_domain))
    }

    async fn create_user(&self, username: &str, display_name: &str, rw: Option<&str>) -> Result<AuthUser, AuthError> {
        self.insert_user(username, display_name, rw, None).await
    }

    async fn create_user_with_password(
        &self,
        username: &str,
        display_name: &str,
        rw: Option<&str>,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, AuthError> {
        self.insert_user(username, display_name, rw, Some((password_hash, password_algorithm))).await
    }

    async fn list_users_in_rw(&self, rw: &str) -> Result<Vec<AuthUser>, AuthError> {
        Ok(self
            .users()
            .await?
            .iter()
            .filter(|u| u.rw.as_deref() == Some(rw))
            .map(StoredUser::to_domain)
            .collect())
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        Ok(self.users().await?.iter().find(|u| u.id == user_id).and_then(StoredUser::credentials))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        self.modify_user(user_id, move |u| {
            u.password_hash = Some(password_hash.clone());
            u.password_algorithm = Some(password_algorithm.clone());
            Credentials { user_id, password_hash, password_algorithm }
        })
        .await
    }

    async fn mark_password_changed(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.modify_user(user_id, |u| {
            u.password_changed = true;
            u.password_changed_at = Some(Utc::now());
        })
        .await
    }

    async fn get_admin_override(&self, admin_id: Uuid) -> Result<Option<AdminOverride>, AuthError> {
        let Some(overrides) = self.store.get(ADMIN_PASSWORDS_KEY).await? else { return Ok(None) };
        match overrides.get(admin_id.to_string()) {
            None | Some(Value::Null) => Ok(None),
            Some(entry) => serde_json::from_value(entry.clone())
                .map(Some)
                .map_err(|e| AuthError::Repository(format!("admin override for {admin_id}: {e}"))),
        }
    }

    async fn set_admin_override(&self, admin_id: Uuid, password_hash: String) -> Result<AdminOverride, AuthError> {
        let entry = AdminOverride { password_hash, changed_at: Utc::now() };
        let stored = serde_json::to_value(&entry).map_err(|e| AuthError::Repository(e.to_string()))?;
        // entries are kept as raw JSON so one unreadable override cannot block another admin
        kv::modify(self.store.as_ref(), ADMIN_PASSWORDS_KEY, move |map: &mut HashMap<String, Value>| {
            map.insert(admin_id.to_string(), stored);
            Ok(())
        })
        .await?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn repo() -> LocalAuthRepository {
        LocalAuthRepository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn create_and_find_by_username() -> Result<(), anyhow::Error> {
        let repo = repo();
        let u = repo.create_user("budi", "Budi Santoso", Some("01")).await?;
        assert_eq!(u.role, Role::User);
        let found = repo.find_users_by_username("budi").await?;
        assert_eq!(found, vec![u.clone()]);
        assert!(repo.find_users_by_username("sari").await?.is_empty());
        assert_eq!(repo.get_user(u.id).await?, Some(u));
        Ok(())
    }

    #[tokio::test]
    async fn credentials_are_stored_on_the_registry_entry() -> Result<(), anyhow::Error> {
        let repo = repo();
        let u = repo.create_user("budi", "Budi", None).await?;
        assert!(repo.get_credentials(u.id).await?.is_none());
        repo.upsert_password(u.id, "$argon2id$fake".into(), "argon2".into()).await?;
        let c = repo.get_credentials(u.id).await?.unwrap();
        assert_eq!(c.password_hash, "$argon2id$fake");

        repo.mark_password_changed(u.id).await?;
        let after = repo.get_user(u.id).await?.unwrap();
        assert!(after.password_changed);
        assert!(after.password_changed_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_updates_fail_with_not_found() {
        let repo = repo();
        let res = repo.upsert_password(Uuid::new_v4(), "h".into(), "argon2".into()).await;
        assert!(matches!(res, Err(AuthError::NotFound)));
    }

    #[tokio::test]
    async fn lists_users_by_jurisdiction() -> Result<(), anyhow::Error> {
        let repo = repo();
        repo.create_user("budi", "Budi", Some("01")).await?;
        repo.create_user("sari", "Sari", Some("02")).await?;
        repo.create_user("tono", "Tono", None).await?;
        let rw01 = repo.list_users_in_rw("01").await?;
        assert_eq!(rw01.len(), 1);
        assert_eq!(rw01[0].username, "budi");
        assert!(repo.list_users_in_rw("03").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn admin_override_round_trip() -> Result<(), anyhow::Error> {
        let repo = repo();
        let admin = crate::auth::domain::ADMIN_ACCOUNTS[0].id;
        assert!(repo.get_admin_override(admin).await?.is_none());
        repo.set_admin_override(admin, "$argon2id$new".into()).await?;
        let o = repo.get_admin_override(admin).await?.unwrap();
        assert_eq!(o.password_hash, "$argon2id$new");
        assert!(repo.get_admin_override(crate::auth::domain::ADMIN_ACCOUNTS[1].id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn user_and_password_are_written_together() -> Result<(), anyhow::Error> {
        let repo = repo();
        let u = repo
            .create_user_with_password("budi", "Budi", Some("01"), "$argon2id$fake".into(), "argon2".into())
            .await?;
        let c = repo.get_credentials(u.id).await?.unwrap();
        assert_eq!(c.password_hash, "$argon2id$fake");
        assert_eq!(repo.find_users_by_username("budi").await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_override_only_affects_its_own_admin() -> Result<(), anyhow::Error> {
        let store = Arc::new(MemoryStore::new());
        let first = crate::auth::domain::ADMIN_ACCOUNTS[0].id;
        let second = crate::auth::domain::ADMIN_ACCOUNTS[1].id;
        store
            .set(ADMIN_PASSWORDS_KEY, serde_json::json!({ first.to_string(): "rahasia1" }))
            .await?;
        let repo = LocalAuthRepository::new(store);

        assert!(repo.get_admin_override(second).await?.is_none());
        assert!(matches!(repo.get_admin_override(first).await, Err(AuthError::Repository(_))));

        repo.set_admin_override(second, "$argon2id$new".into()).await?;
        assert_eq!(repo.get_admin_override(second).await?.unwrap().password_hash, "$argon2id$new");
        Ok(())
    }
}
