//! Picks the persistence implementations once at startup.

use std::sync::Arc;

use configs::{AppConfig, DatabaseConfig, StorageConfig, StorageMode};
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::auth::repo::{LocalAuthRepository, SeaOrmAuthRepository};
use crate::auth::repository::AuthRepository;
use crate::auth::service::{AuthConfig, AuthService};
use crate::auth::session::SessionManager;
use crate::errors::ServiceError;
use crate::profiles::repo::{LocalProfileRepository, SeaOrmProfileRepository};
use crate::profiles::{ProfileRepository, ProfileService};
use crate::storage::legacy::normalize_legacy_ids;
use crate::storage::{JsonFileStore, KeyValueStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Database,
    Local,
}

/// Resolve the storage mode against the database settings.
pub fn select_kind(storage: &StorageConfig, database: &DatabaseConfig) -> Result<BackendKind, ServiceError> {
    match storage.mode {
        StorageMode::Local => Ok(BackendKind::Local),
        StorageMode::Auto if database.is_configured() => Ok(BackendKind::Database),
        StorageMode::Auto => Ok(BackendKind::Local),
        StorageMode::Remote if database.is_configured() => Ok(BackendKind::Database),
        StorageMode::Remote => Err(ServiceError::NotConfigured(
            "storage.mode = \"remote\" requires database.url or DATABASE_URL".into(),
        )),
    }
}

/// Repositories for one backend, plus the store holding the interactive session slot.
#[derive(Clone)]
pub struct Backends {
    pub kind: BackendKind,
    pub profiles: Arc<dyn ProfileRepository>,
    pub auth: Arc<dyn AuthRepository>,
    pub session_slot: Arc<dyn KeyValueStore>,
}

impl Backends {
    /// Local backend over `store`. Rewrites legacy non-UUID ids first.
    pub async fn local(store: Arc<dyn KeyValueStore>) -> Result<Self, ServiceError> {
        normalize_legacy_ids(store.as_ref()).await?;
        Ok(Self {
            kind: BackendKind::Local,
            profiles: Arc::new(LocalProfileRepository::new(store.clone())),
            auth: Arc::new(LocalAuthRepository::new(store.clone())),
            session_slot: store,
        })
    }

    pub fn database(db: DatabaseConnection, session_slot: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kind: BackendKind::Database,
            profiles: Arc::new(SeaOrmProfileRepository::new(db.clone())),
            auth: Arc::new(SeaOrmAuthRepository::new(db)),
            session_slot,
        }
    }

    /// Open whichever backend the configuration selects. The database backend
    /// is migrated before use.
    pub async fn from_config(cfg: &AppConfig) -> Result<Self, ServiceError> {
        let kind = select_kind(&cfg.storage, &cfg.database)?;
        common::env::ensure_data_dir(&cfg.storage.data_dir).await.map_err(ServiceError::backend)?;
        let files: Arc<dyn KeyValueStore> = JsonFileStore::new(&cfg.storage.data_dir).await?;
        match kind {
            BackendKind::Local => {
                info!(data_dir = %cfg.storage.data_dir, "using local storage");
                Self::local(files).await
            }
            BackendKind::Database => {
                let db = models::db::connect_with_config(&cfg.database).await.map_err(ServiceError::backend)?;
                migration::Migrator::up(&db, None).await.map_err(ServiceError::backend)?;
                info!("using database storage");
                Ok(Self::database(db, files))
            }
        }
    }
}

/// The services built on one set of backends.
#[derive(Clone)]
pub struct Services {
    pub kind: BackendKind,
    pub profiles: Arc<ProfileService>,
    pub auth: Arc<AuthService<dyn AuthRepository>>,
    /// Single-slot session API for interactive, single-user clients. The HTTP
    /// server does not use it: requests carry their identity in a token, so
    /// the `current_user` slot is never written while serving.
    pub sessions: Arc<SessionManager>,
}

impl Services {
    pub fn new(backends: Backends, cfg: &AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(backends.auth.clone(), AuthConfig::from(&cfg.auth)));
        Self {
            kind: backends.kind,
            profiles: Arc::new(ProfileService::new(backends.profiles, backends.auth, cfg.storage.owner_id_policy)),
            sessions: Arc::new(SessionManager::new(auth.clone(), backends.session_slot)),
            auth,
        }
    }
}
