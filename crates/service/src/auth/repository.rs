use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AdminOverride, AuthUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
///
/// Implemented once over the database and once over the local key/value
/// store; `crate::backend` picks one at startup.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Every registry entry with this username, oldest first.
    async fn find_users_by_username(&self, username: &str) -> Result<Vec<AuthUser>, AuthError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    async fn create_user(&self, username: &str, display_name: &str, rw: Option<&str>) -> Result<AuthUser, AuthError>;
    /// Create a registry entry together with its credential. Either both are
    /// stored or neither is.
    async fn create_user_with_password(
        &self,
        username: &str,
        display_name: &str,
        rw: Option<&str>,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, AuthError>;
    async fn list_users_in_rw(&self, rw: &str) -> Result<Vec<AuthUser>, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;
    /// Set the password-change bookkeeping flags on a registry entry.
    async fn mark_password_changed(&self, user_id: Uuid) -> Result<(), AuthError>;

    async fn get_admin_override(&self, admin_id: Uuid) -> Result<Option<AdminOverride>, AuthError>;
    async fn set_admin_override(&self, admin_id: Uuid, password_hash: String) -> Result<AdminOverride, AuthError>;
}
