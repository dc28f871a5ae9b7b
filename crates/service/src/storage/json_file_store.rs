use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use tokio::{fs, sync::RwLock};
use tracing::{debug, warn};

use crate::errors::ServiceError;
use crate::storage::kv::{KeyValueStore, Mutation};

/// JSON file-backed key-value store.
///
/// Each key is persisted as `<dir>/<key>.json`. All files are read once at
/// startup into an in-memory map; writes go to the map and then to disk while
/// the write lock is held, so a read-modify-write on one key never interleaves
/// with another.
#[derive(Clone)]
pub struct JsonFileStore {
    inner: Arc<RwLock<HashMap<String, Value>>>,
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (creating if missing) the data directory and load every `*.json` file in it.
    pub async fn new<P: Into<PathBuf>>(dir: P) -> Result<Arc<Self>, ServiceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(ServiceError::backend)?;

        let mut map = HashMap::new();
        let mut entries = fs::read_dir(&dir).await.map_err(ServiceError::backend)?;
        while let Some(entry) = entries.next_entry().await.map_err(ServiceError::backend)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let bytes = fs::read(&path).await.map_err(ServiceError::backend)?;
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(v) => {
                    map.insert(key, v);
                }
                Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable store file"),
            }
        }
        debug!(dir = %dir.display(), keys = map.len(), "json file store loaded");

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), dir }))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ServiceError> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ServiceError::Validation(format!("invalid store key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    async fn write_file(&self, key: &str, value: Option<&Value>) -> Result<(), ServiceError> {
        let path = self.path_for(key)?;
        match value {
            Some(v) => {
                let data = serde_json::to_vec_pretty(v)?;
                fs::write(&path, data).await.map_err(ServiceError::backend)
            }
            None => match fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(ServiceError::backend(e)),
            },
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, ServiceError> {
        self.path_for(key)?;
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        self.write_file(key, Some(&value)).await?;
        map.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, ServiceError> {
        let mut map = self.inner.write().await;
        self.write_file(key, None).await?;
        Ok(map.remove(key).is_some())
    }

    async fn keys(&self) -> Vec<String> {
        self.inner.read().await.keys().cloned().collect()
    }

    async fn update<'a>(&self, key: &str, f: Mutation<'a>) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        let next = f(map.get(key).cloned())?;
        self.write_file(key, next.as_ref()).await?;
        match next {
            Some(v) => map.insert(key.to_string(), v),
            None => map.remove(key),
        };
        Ok(())
    }
}
