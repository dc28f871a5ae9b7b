use std::sync::Arc;

use common::types::Outcome;
use tracing::{info, warn};

use super::domain::{LoginInput, RegisterInput, SessionUser};
use super::errors::AuthError;
use super::repository::AuthRepository;
use super::service::AuthService;
use crate::storage::kv::{self, KeyValueStore};
use crate::storage::CURRENT_USER_KEY;

/// Holds the one "current session" of an interactive client.
///
/// The slot lives in a [`KeyValueStore`] so a local client keeps its session
/// across restarts. User-facing failures come back as `false` or a failed
/// [`Outcome`], never as errors.
pub struct SessionManager {
    auth: Arc<AuthService<dyn AuthRepository>>,
    slot: Arc<dyn KeyValueStore>,
}

impl SessionManager {
    pub fn new(auth: Arc<AuthService<dyn AuthRepository>>, slot: Arc<dyn KeyValueStore>) -> Self {
        Self { auth, slot }
    }

    pub async fn login(&self, input: LoginInput) -> bool {
        let user = match self.auth.authenticate(input).await {
            Ok(user) => user,
            Err(e) => {
                info!(code = e.code(), "login rejected: {}", e);
                return false;
            }
        };
        match kv::save(self.slot.as_ref(), CURRENT_USER_KEY, &user).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to persist session");
                false
            }
        }
    }

    /// Creates the account without signing in.
    pub async fn register(&self, input: RegisterInput) -> Outcome {
        match self.auth.register(input).await {
            Ok(user) => Outcome::ok(format!("registered {}", user.username)),
            Err(AuthError::Conflict) => Outcome::failed("username already registered"),
            Err(AuthError::Validation(msg)) => Outcome::failed(msg),
            Err(e) => {
                warn!(error = %e, "registration failed");
                Outcome::failed("registration failed")
            }
        }
    }

    pub async fn logout(&self) {
        if let Err(e) = self.slot.remove(CURRENT_USER_KEY).await {
            warn!(error = %e, "failed to clear session");
        }
    }

    /// The signed-in identity, if any. An unreadable slot counts as signed out.
    pub async fn current(&self) -> Option<SessionUser> {
        match kv::load::<SessionUser>(self.slot.as_ref(), CURRENT_USER_KEY).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "discarding unreadable session");
                None
            }
        }
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Outcome {
        let Some(user) = self.current().await else {
            return Outcome::failed(AuthError::NoSession.to_string());
        };
        match self.auth.change_password(&user, old_password, new_password).await {
            Ok(()) => Outcome::ok("password changed"),
            Err(AuthError::Unauthorized) => Outcome::failed("old password is incorrect"),
            Err(AuthError::Validation(msg)) => Outcome::failed(msg),
            Err(e) => {
                warn!(error = %e, "password change failed");
                Outcome::failed("password change failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::ADMIN_ACCOUNTS;
    use crate::auth::repo::LocalAuthRepository;
    use crate::auth::service::AuthConfig;
    use crate::storage::MemoryStore;

    fn manager() -> SessionManager {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let repo: Arc<dyn AuthRepository> = Arc::new(LocalAuthRepository::new(store.clone()));
        let auth = Arc::new(AuthService::new(repo, AuthConfig::default()));
        SessionManager::new(auth, store)
    }

    fn user_login(username: &str, password: &str) -> LoginInput {
        LoginInput { username: username.into(), password: password.into(), rw: None }
    }

    fn admin_login(password: &str, rw: &str) -> LoginInput {
        LoginInput { username: "admin".into(), password: password.into(), rw: Some(rw.into()) }
    }

    fn registration(username: &str, password: &str) -> RegisterInput {
        RegisterInput { username: username.into(), display_name: "Sari".into(), password: password.into(), rw: Some("02".into()) }
    }

    #[tokio::test]
    async fn register_does_not_sign_in() {
        let m = manager();
        let outcome = m.register(registration("sari", "rahasia")).await;
        assert!(outcome.success, "{}", outcome.message);
        assert!(m.current().await.is_none());

        let again = m.register(registration("sari", "lain123")).await;
        assert!(!again.success);
    }

    #[tokio::test]
    async fn login_fills_slot_and_logout_clears_it() {
        let m = manager();
        m.register(registration("sari", "rahasia")).await;
        assert!(!m.login(user_login("sari", "keliru")).await);
        assert!(m.current().await.is_none());

        assert!(m.login(user_login("sari", "rahasia")).await);
        let current = m.current().await.unwrap();
        assert_eq!(current.username, "sari");
        assert_eq!(current.rw.as_deref(), Some("02"));

        m.logout().await;
        assert!(m.current().await.is_none());
    }

    #[tokio::test]
    async fn change_password_needs_session() {
        let m = manager();
        let outcome = m.change_password("admin", "baru123").await;
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn admin_default_password_stops_working_after_change() {
        let m = manager();
        assert!(m.login(admin_login("admin", "01")).await);
        assert_eq!(m.current().await.map(|u| u.id), Some(ADMIN_ACCOUNTS[0].id));

        assert!(!m.change_password("admin", "admin").await.success);
        assert!(!m.change_password("admin", "abc").await.success);
        assert!(m.change_password("admin", "baru123").await.success);

        m.logout().await;
        assert!(!m.login(admin_login("admin", "01")).await);
        assert!(m.login(admin_login("baru123", "01")).await);
    }

    #[tokio::test]
    async fn stored_session_has_no_password_material() -> Result<(), anyhow::Error> {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let repo: Arc<dyn AuthRepository> = Arc::new(LocalAuthRepository::new(store.clone()));
        let m = SessionManager::new(Arc::new(AuthService::new(repo, AuthConfig::default())), store.clone());
        m.register(registration("sari", "rahasia")).await;
        assert!(m.login(user_login("sari", "rahasia")).await);

        let raw = store.get(CURRENT_USER_KEY).await?.unwrap().to_string();
        assert!(!raw.contains("rahasia"));
        assert!(!raw.contains("password"));
        Ok(())
    }
}
