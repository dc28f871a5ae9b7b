use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation as JwtValidation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::{
    admin_by_id, admin_for_rw, AuthSession, AuthUser, LoginInput, RegisterInput, Role, SessionUser,
    ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD, MIN_PASSWORD_LEN,
};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Tokens are only issued when a secret is configured.
    pub jwt_secret: Option<String>,
    pub password_algorithm: String,
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: None, password_algorithm: "argon2".into(), token_ttl_hours: 12 }
    }
}

impl From<&configs::AuthSettings> for AuthConfig {
    fn from(s: &configs::AuthSettings) -> Self {
        let secret = s.jwt_secret.trim();
        Self {
            jwt_secret: (!secret.is_empty()).then(|| secret.to_string()),
            password_algorithm: "argon2".into(),
            token_ttl_hours: s.token_ttl_hours,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    uid: String,
    name: String,
    role: Role,
    #[serde(default)]
    rw: Option<String>,
    exp: usize,
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository + ?Sized> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    pub fn repository(&self) -> &Arc<R> { &self.repo }

    /// Register a new `user`-role account with a hashed password.
    /// Does not sign the caller in.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        let username = input.username.trim();
        if username.is_empty() || input.password.is_empty() {
            return Err(AuthError::Validation("username and password are required".into()));
        }
        if username.eq_ignore_ascii_case(ADMIN_USERNAME) {
            return Err(AuthError::Validation("username is reserved".into()));
        }
        if !self.repo.find_users_by_username(username).await?.is_empty() {
            debug!("username taken: {}", username);
            return Err(AuthError::Conflict);
        }

        let display_name = match input.display_name.trim() {
            "" => username,
            name => name,
        };
        let rw = input.rw.as_deref().map(str::trim).filter(|rw| !rw.is_empty());
        let hash = hash_password(&input.password)?;
        let user = self
            .repo
            .create_user_with_password(username, display_name, rw, hash, self.cfg.password_algorithm.clone())
            .await?;
        info!(user_id = %user.id, username = %user.username, rw = ?user.rw, "user_registered");
        Ok(user)
    }

    /// Check credentials and return the identity they belong to.
    ///
    /// `admin` logins resolve the account through `input.rw`; an admin with a
    /// password override no longer accepts the shared default.
    #[instrument(skip(self, input), fields(username = %input.username, rw = ?input.rw))]
    pub async fn authenticate(&self, input: LoginInput) -> Result<SessionUser, AuthError> {
        let username = input.username.trim();
        if username == ADMIN_USERNAME {
            let admin = input.rw.as_deref().and_then(admin_for_rw).ok_or(AuthError::Unauthorized)?;
            if !self.admin_password_matches(admin.id, &input.password).await? {
                return Err(AuthError::Unauthorized);
            }
            info!(user_id = %admin.id, rw = admin.rw, "admin_authenticated");
            return Ok(SessionUser::from(admin));
        }

        for user in self.repo.find_users_by_username(username).await? {
            let Some(cred) = self.repo.get_credentials(user.id).await? else { continue };
            if verify_password(&input.password, &cred.password_hash)? {
                info!(user_id = %user.id, "user_authenticated");
                return Ok(SessionUser::from(&user));
            }
        }
        Err(AuthError::Unauthorized)
    }

    /// Authenticate and, when a secret is configured, issue a session token.
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.authenticate(input).await?;
        let token = match self.cfg.jwt_secret {
            Some(_) => Some(self.issue_token(&user)?),
            None => None,
        };
        Ok(AuthSession { user, token })
    }

    /// Replace the password of the signed-in identity.
    #[instrument(skip(self, session, old_password, new_password), fields(user_id = %session.id, role = ?session.role))]
    pub async fn change_password(&self, session: &SessionUser, old_password: &str, new_password: &str) -> Result<(), AuthError> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!("new password too short (>={MIN_PASSWORD_LEN})")));
        }
        if new_password == old_password {
            return Err(AuthError::Validation("new password must differ from the old one".into()));
        }

        if session.is_admin() {
            let admin = admin_by_id(session.id).ok_or(AuthError::NotFound)?;
            if !self.admin_password_matches(admin.id, old_password).await? {
                return Err(AuthError::Unauthorized);
            }
            let hash = hash_password(new_password)?;
            let saved = self.repo.set_admin_override(admin.id, hash).await?;
            info!(user_id = %admin.id, changed_at = %saved.changed_at, "admin_password_changed");
            return Ok(());
        }

        let cred = self.repo.get_credentials(session.id).await?.ok_or(AuthError::Unauthorized)?;
        if !verify_password(old_password, &cred.password_hash)? {
            return Err(AuthError::Unauthorized);
        }
        let hash = hash_password(new_password)?;
        self.repo.upsert_password(session.id, hash, self.cfg.password_algorithm.clone()).await?;
        self.repo.mark_password_changed(session.id).await?;
        info!(user_id = %session.id, "password_changed");
        Ok(())
    }

    /// Users registered in jurisdiction `rw`, for admin views.
    pub async fn list_users_in_rw(&self, rw: &str) -> Result<Vec<AuthUser>, AuthError> {
        self.repo.list_users_in_rw(rw).await
    }

    /// Signed HS256 token carrying the session identity.
    pub fn issue_token(&self, session: &SessionUser) -> Result<String, AuthError> {
        let secret = self.secret()?;
        let exp = (chrono::Utc::now() + chrono::Duration::hours(self.cfg.token_ttl_hours)).timestamp().max(0) as usize;
        let claims = Claims {
            sub: session.username.clone(),
            uid: session.id.to_string(),
            name: session.display_name.clone(),
            role: session.role,
            rw: session.rw.clone(),
            exp,
        };
        encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Decode a token produced by [`Self::issue_token`]. Expired or tampered
    /// tokens are `Unauthorized`.
    pub fn verify_token(&self, token: &str) -> Result<SessionUser, AuthError> {
        let secret = self.secret()?;
        let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &JwtValidation::default())
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                AuthError::Unauthorized
            })?;
        let claims = data.claims;
        let id = Uuid::parse_str(&claims.uid).map_err(|_| AuthError::Unauthorized)?;
        Ok(SessionUser { id, username: claims.sub, display_name: claims.name, role: claims.role, rw: claims.rw })
    }

    fn secret(&self) -> Result<&str, AuthError> {
        self.cfg.jwt_secret.as_deref().ok_or_else(|| AuthError::TokenError("jwt secret not configured".into()))
    }

    async fn admin_password_matches(&self, admin_id: Uuid, password: &str) -> Result<bool, AuthError> {
        match self.repo.get_admin_override(admin_id).await? {
            Some(o) => verify_password(password, &o.password_hash),
            None => Ok(password == DEFAULT_ADMIN_PASSWORD),
        }
    }
}

pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

/// A stored hash that does not parse never matches.
fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "stored password hash is not a PHC string");
            return Ok(false);
        }
    };
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}
