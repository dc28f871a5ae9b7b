use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;
use rand::distributions::{Alphanumeric, DistString};
use tracing::warn;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Unset leaves the choice to `TOKIO_WORKER_THREADS` or tokio's default.
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Empty means "not configured"; in `auto` storage mode that selects the local store.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Which persistence backend to use.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Database when `database.url` is set, local files otherwise.
    #[default]
    Auto,
    Remote,
    Local,
}

/// What to do with a malformed owner id on create.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OwnerIdPolicy {
    #[default]
    Reject,
    /// Replace it with a freshly generated UUID (older clients relied on this).
    Regenerate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub mode: StorageMode,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub owner_id_policy: OwnerIdPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { mode: StorageMode::Auto, data_dir: default_data_dir(), owner_id_policy: OwnerIdPolicy::Reject }
    }
}

fn default_data_dir() -> String { "data".into() }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self { jwt_secret: String::new(), token_ttl_hours: default_token_ttl() }
    }
}

fn default_token_ttl() -> i64 { 12 }

const GENERATED_SECRET_LEN: usize = 64;

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Like `load_and_validate`, but a missing config file falls back to
    /// defaults plus environment variables. A file that exists but does not
    /// parse is still an error.
    pub fn load_or_default() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        if self.storage.data_dir.trim().is_empty() {
            self.storage.data_dir = default_data_dir();
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if self.worker_threads == Some(0) {
            self.worker_threads = None;
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // fill from DATABASE_URL when the file leaves it empty
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Validate pool settings. An empty url is allowed here; whether it is
    /// required depends on the storage mode.
    pub fn validate(&self) -> Result<()> {
        if self.is_configured() {
            let lower = self.url.to_lowercase();
            if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
                return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
            }
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthSettings {
    pub fn normalize_from_env(&mut self) {
        self.resolve_secret(std::env::var("JWT_SECRET").ok());
    }

    /// File value first, then `env_secret`. With neither, a random secret is
    /// generated for this process only.
    fn resolve_secret(&mut self, env_secret: Option<String>) {
        if self.jwt_secret.trim().is_empty() {
            self.jwt_secret = env_secret.unwrap_or_default();
        }
        if self.jwt_secret.trim().is_empty() {
            warn!(
                event = "jwt_secret_generated",
                "no auth.jwt_secret or JWT_SECRET set; using a random secret, issued tokens will not survive a restart"
            );
            self.jwt_secret = Alphanumeric.sample_string(&mut rand::thread_rng(), GENERATED_SECRET_LEN);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() -> Result<()> {
        let cfg = parse("")?;
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.storage.mode, StorageMode::Auto);
        assert_eq!(cfg.storage.owner_id_policy, OwnerIdPolicy::Reject);
        assert_eq!(cfg.storage.data_dir, "data");
        assert_eq!(cfg.auth.token_ttl_hours, 12);
        assert!(!cfg.database.is_configured());
        Ok(())
    }

    #[test]
    fn parses_storage_section() -> Result<()> {
        let cfg = parse(
            r#"
            [storage]
            mode = "local"
            data_dir = "/tmp/umkm"
            owner_id_policy = "regenerate"
            "#,
        )?;
        assert_eq!(cfg.storage.mode, StorageMode::Local);
        assert_eq!(cfg.storage.data_dir, "/tmp/umkm");
        assert_eq!(cfg.storage.owner_id_policy, OwnerIdPolicy::Regenerate);
        Ok(())
    }

    #[test]
    fn rejects_non_postgres_url() {
        let db = DatabaseConfig { url: "mysql://localhost/umkm".into(), ..DatabaseConfig::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn empty_url_is_valid_until_a_mode_requires_it() {
        assert!(DatabaseConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let db = DatabaseConfig { max_connections: 1, min_connections: 2, ..DatabaseConfig::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn missing_jwt_secret_gets_a_random_one() {
        let mut a = AuthSettings::default();
        let mut b = AuthSettings::default();
        a.resolve_secret(None);
        b.resolve_secret(Some("   ".into()));
        assert_eq!(a.jwt_secret.len(), GENERATED_SECRET_LEN);
        assert_eq!(b.jwt_secret.len(), GENERATED_SECRET_LEN);
        assert_ne!(a.jwt_secret, b.jwt_secret);
    }

    #[test]
    fn configured_jwt_secret_wins_over_env() {
        let mut from_file = AuthSettings { jwt_secret: "file-secret".into(), ..AuthSettings::default() };
        from_file.resolve_secret(Some("env-secret".into()));
        assert_eq!(from_file.jwt_secret, "file-secret");

        let mut from_env = AuthSettings::default();
        from_env.resolve_secret(Some("env-secret".into()));
        assert_eq!(from_env.jwt_secret, "env-secret");
    }

    #[test]
    fn worker_threads_stay_unset_unless_configured() -> Result<()> {
        let mut cfg = parse("[server]\nhost = \"0.0.0.0\"\nport = 9000\n")?;
        cfg.server.normalize()?;
        assert_eq!(cfg.server.worker_threads, None);

        let mut zero = parse("[server]\nhost = \"0.0.0.0\"\nport = 9000\nworker_threads = 0\n")?;
        zero.server.normalize()?;
        assert_eq!(zero.server.worker_threads, None);

        let mut two = parse("[server]\nhost = \"0.0.0.0\"\nport = 9000\nworker_threads = 2\n")?;
        two.server.normalize()?;
        assert_eq!(two.server.worker_threads, Some(2));
        Ok(())
    }
}
