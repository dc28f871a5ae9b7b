use std::collections::HashMap;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::ServiceError;

/// In-place mutation of the value stored under one key. Receives the current
/// value (or `None`) and returns the replacement (`None` removes the key).
pub type Mutation<'a> = Box<dyn FnOnce(Option<Value>) -> Result<Option<Value>, ServiceError> + Send + 'a>;

/// String-keyed store of JSON values.
/// Implementations must apply `update` atomically with respect to other calls
/// on the same store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, ServiceError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), ServiceError>;
    /// Returns whether the key existed.
    async fn remove(&self, key: &str) -> Result<bool, ServiceError>;
    async fn keys(&self) -> Vec<String>;
    async fn update<'a>(&self, key: &str, f: Mutation<'a>) -> Result<(), ServiceError>;
}

/// Read and deserialize the value under `key`.
pub async fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, ServiceError> {
    match store.get(key).await? {
        Some(v) => Ok(Some(serde_json::from_value(v)?)),
        None => Ok(None),
    }
}

/// Serialize and store `value` under `key`.
pub async fn save<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), ServiceError> {
    store.set(key, serde_json::to_value(value)?).await
}

/// Typed read-modify-write: a missing key starts from `T::default()`, the
/// result of `f` is written back and its return value handed to the caller.
pub async fn modify<T, R, F>(store: &dyn KeyValueStore, key: &str, f: F) -> Result<R, ServiceError>
where
    T: Serialize + DeserializeOwned + Default,
    R: Send,
    F: FnOnce(&mut T) -> Result<R, ServiceError> + Send,
{
    let mut out: Option<R> = None;
    let slot = &mut out;
    store
        .update(
            key,
            Box::new(move |current| {
                let mut value: T = match current {
                    Some(v) => serde_json::from_value(v)?,
                    None => T::default(),
                };
                *slot = Some(f(&mut value)?);
                Ok(Some(serde_json::to_value(&value)?))
            }),
        )
        .await?;
    out.ok_or_else(|| ServiceError::Backend(format!("update of {key} did not run")))
}

/// Process-local store, used by tests and as a throwaway session slot.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, ServiceError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), ServiceError> {
        self.inner.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, ServiceError> {
        Ok(self.inner.write().await.remove(key).is_some())
    }

    async fn keys(&self) -> Vec<String> {
        self.inner.read().await.keys().cloned().collect()
    }

    async fn update<'a>(&self, key: &str, f: Mutation<'a>) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        match f(map.get(key).cloned())? {
            Some(v) => map.insert(key.to_string(), v),
            None => map.remove(key),
        };
        Ok(())
    }
}
