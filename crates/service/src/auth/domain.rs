use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved login name shared by every predefined admin account.
pub const ADMIN_USERNAME: &str = "admin";
/// Password every admin account accepts until it sets its own.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => models::user::ROLE_ADMIN,
            Role::User => models::user::ROLE_USER,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            models::user::ROLE_ADMIN => Some(Role::Admin),
            models::user::ROLE_USER => Some(Role::User),
            _ => None,
        }
    }
}

/// A predefined privileged account, one per jurisdiction (RW).
#[derive(Debug, Clone, Copy)]
pub struct AdminAccount {
    pub id: Uuid,
    pub rw: &'static str,
    pub display_name: &'static str,
}

pub const ADMIN_ACCOUNTS: [AdminAccount; 2] = [
    AdminAccount {
        id: Uuid::from_u128(0x00000000_0000_4000_8000_000000000001),
        rw: "01",
        display_name: "Admin RW 01",
    },
    AdminAccount {
        id: Uuid::from_u128(0x00000000_0000_4000_8000_000000000002),
        rw: "02",
        display_name: "Admin RW 02",
    },
];

pub fn admin_for_rw(rw: &str) -> Option<&'static AdminAccount> {
    ADMIN_ACCOUNTS.iter().find(|a| a.rw == rw.trim())
}

pub fn admin_by_id(id: Uuid) -> Option<&'static AdminAccount> {
    ADMIN_ACCOUNTS.iter().find(|a| a.id == id)
}

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub display_name: String,
    pub password: String,
    #[serde(default)]
    pub rw: Option<String>,
}

/// Login input. `rw` picks the admin account when `username` is `admin`
/// and is ignored otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub rw: Option<String>,
}

/// Domain user (registry view)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub rw: Option<String>,
    pub created_at: DateTime<Utc>,
    pub password_changed: bool,
    pub password_changed_at: Option<DateTime<Utc>>,
}

/// Domain credentials (hashed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: Uuid,
    pub password_hash: String,
    pub password_algorithm: String,
}

/// Password set by an admin account in place of the shared default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOverride {
    pub password_hash: String,
    pub changed_at: DateTime<Utc>,
}

/// Authenticated identity. Carries no password material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub rw: Option<String>,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&AuthUser> for SessionUser {
    fn from(u: &AuthUser) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            display_name: u.display_name.clone(),
            role: u.role,
            rw: u.rw.clone(),
        }
    }
}

impl From<&AdminAccount> for SessionUser {
    fn from(a: &AdminAccount) -> Self {
        Self {
            id: a.id,
            username: ADMIN_USERNAME.to_string(),
            display_name: a.display_name.to_string(),
            role: Role::Admin,
            rw: Some(a.rw.to_string()),
        }
    }
}

/// Login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: SessionUser,
    pub token: Option<String>,
}
