//! One-shot migration of local data written before ids became UUIDs.
//!
//! Older registry entries and sessions carry ids such as `user_1699999999`.
//! Every identity whose id is not a well-formed UUID gets a fresh one, and
//! business profiles follow their owner to the new id. Plaintext passwords
//! left in registry entries are hashed, and dropped from the session slot.
//! Admin overrides stored as plain strings become hashed override records.

use std::collections::HashMap;

use common::ids::is_uuid;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::storage::kv::KeyValueStore;
use crate::storage::{ADMIN_PASSWORDS_KEY, CURRENT_USER_KEY, PROFILES_KEY, USERS_KEY};

/// Counts of rewritten entries, for logging and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizationReport {
    pub users: usize,
    pub session: bool,
    pub profile_ids: usize,
    pub profile_owners: usize,
    pub passwords: usize,
    pub admin_overrides: usize,
}

impl NormalizationReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Rewrite malformed ids under the users, session, and profile keys, and
/// hash any plaintext password still on disk.
pub async fn normalize_legacy_ids(store: &dyn KeyValueStore) -> Result<NormalizationReport, ServiceError> {
    let mut report = NormalizationReport::default();
    let mut remap: HashMap<String, String> = HashMap::new();

    if let Some(mut users) = store.get(USERS_KEY).await? {
        if let Some(list) = users.as_array_mut() {
            for entry in list.iter_mut() {
                if let Some(old) = malformed_id(entry, "id") {
                    let fresh = Uuid::new_v4().to_string();
                    entry["id"] = Value::String(fresh.clone());
                    remap.insert(old, fresh);
                    report.users += 1;
                }
                if hash_plaintext_password(entry)? {
                    report.passwords += 1;
                }
            }
        }
        if report.users + report.passwords > 0 {
            store.set(USERS_KEY, users).await?;
        }
    }

    if let Some(mut current) = store.get(CURRENT_USER_KEY).await? {
        if let Some(old) = malformed_id(&current, "id") {
            let fresh = remap.get(&old).cloned().unwrap_or_else(|| Uuid::new_v4().to_string());
            current["id"] = Value::String(fresh);
            report.session = true;
        }
        let had_password = current.as_object_mut().is_some_and(|o| o.remove("password").is_some());
        if report.session || had_password {
            store.set(CURRENT_USER_KEY, current).await?;
        }
    }

    if let Some(mut profiles) = store.get(PROFILES_KEY).await? {
        if let Some(list) = profiles.as_array_mut() {
            for entry in list.iter_mut() {
                if malformed_id(entry, "id").is_some() {
                    entry["id"] = Value::String(Uuid::new_v4().to_string());
                    report.profile_ids += 1;
                }
                let owner = entry.get("user_id").and_then(Value::as_str).map(str::to_string);
                if let Some(new_owner) = owner.and_then(|o| remap.get(&o).cloned()) {
                    entry["user_id"] = Value::String(new_owner);
                    report.profile_owners += 1;
                }
            }
        }
        if report.profile_ids + report.profile_owners > 0 {
            store.set(PROFILES_KEY, profiles).await?;
        }
    }

    if let Some(mut overrides) = store.get(ADMIN_PASSWORDS_KEY).await? {
        if let Some(map) = overrides.as_object_mut() {
            for entry in map.values_mut() {
                if hash_admin_override(entry)? {
                    report.admin_overrides += 1;
                }
            }
        }
        if report.admin_overrides > 0 {
            store.set(ADMIN_PASSWORDS_KEY, overrides).await?;
        }
    }

    if !report.is_empty() {
        info!(
            users = report.users,
            session = report.session,
            profile_ids = report.profile_ids,
            profile_owners = report.profile_owners,
            passwords = report.passwords,
            admin_overrides = report.admin_overrides,
            "normalized legacy ids"
        );
    }
    Ok(report)
}

/// Replace a plaintext `password` with an Argon2 `password_hash`.
fn hash_plaintext_password(entry: &mut Value) -> Result<bool, ServiceError> {
    let Some(obj) = entry.as_object_mut() else { return Ok(false) };
    let Some(Value::String(plain)) = obj.remove("password") else { return Ok(false) };
    if obj.get("password_hash").and_then(Value::as_str).is_none() {
        obj.insert("password_hash".into(), Value::String(argon2_hash(&plain)?));
        obj.insert("password_algorithm".into(), Value::String("argon2".into()));
    }
    Ok(true)
}

/// Older clients stored an admin override as the bare password string.
fn hash_admin_override(entry: &mut Value) -> Result<bool, ServiceError> {
    match entry {
        Value::String(plain) => {
            let hash = argon2_hash(plain)?;
            *entry = json!({ "password_hash": hash, "changed_at": Utc::now() });
            Ok(true)
        }
        Value::Object(_) => {
            let hashed = hash_plaintext_password(entry)?;
            if hashed {
                if let Some(obj) = entry.as_object_mut() {
                    obj.entry("changed_at").or_insert_with(|| json!(Utc::now()));
                }
            }
            Ok(hashed)
        }
        _ => Ok(false),
    }
}

fn argon2_hash(plain: &str) -> Result<String, ServiceError> {
    crate::auth::service::hash_password(plain).map_err(ServiceError::backend)
}

/// The value of `field` when it is present and not a UUID. Numbers count as
/// malformed too (very old entries used `Date.now()` style ids).
fn malformed_id(entry: &Value, field: &str) -> Option<String> {
    match entry.get(field)? {
        Value::String(s) if is_uuid(s) => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn rewrites_users_session_and_profile_owners() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        let kept = Uuid::new_v4().to_string();
        store
            .set(USERS_KEY, json!([{"id": "user_1", "username": "budi"}, {"id": kept, "username": "sari"}]))
            .await?;
        store.set(CURRENT_USER_KEY, json!({"id": "user_1", "username": "budi"})).await?;
        store
            .set(PROFILES_KEY, json!([{"id": "p-1", "user_id": "user_1"}, {"id": Uuid::new_v4().to_string(), "user_id": kept}]))
            .await?;

        let report = normalize_legacy_ids(&store).await?;
        assert_eq!(report, NormalizationReport { users: 1, session: true, profile_ids: 1, profile_owners: 1, passwords: 0, admin_overrides: 0 });

        let users = store.get(USERS_KEY).await?.unwrap();
        let new_id = users[0]["id"].as_str().unwrap().to_string();
        assert!(is_uuid(&new_id));
        assert_eq!(users[1]["id"], json!(kept));

        let current = store.get(CURRENT_USER_KEY).await?.unwrap();
        assert_eq!(current["id"], json!(new_id));

        let profiles = store.get(PROFILES_KEY).await?.unwrap();
        assert!(is_uuid(profiles[0]["id"].as_str().unwrap()));
        assert_eq!(profiles[0]["user_id"], json!(new_id));
        assert_eq!(profiles[1]["user_id"], json!(kept));
        Ok(())
    }

    #[tokio::test]
    async fn clean_store_is_left_alone() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        store.set(USERS_KEY, json!([{"id": Uuid::new_v4().to_string()}])).await?;
        let report = normalize_legacy_ids(&store).await?;
        assert!(report.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn numeric_session_id_gets_fresh_uuid() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        store.set(CURRENT_USER_KEY, json!({"id": 1699999999, "username": "lama"})).await?;
        let report = normalize_legacy_ids(&store).await?;
        assert!(report.session);
        let current = store.get(CURRENT_USER_KEY).await?.unwrap();
        assert!(is_uuid(current["id"].as_str().unwrap()));
        Ok(())
    }

    #[tokio::test]
    async fn plaintext_passwords_are_hashed() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        let id = Uuid::new_v4().to_string();
        store.set(USERS_KEY, json!([{"id": id, "username": "budi", "password": "rahasia"}])).await?;
        store.set(CURRENT_USER_KEY, json!({"id": id, "username": "budi", "password": "rahasia"})).await?;

        let report = normalize_legacy_ids(&store).await?;
        assert_eq!(report.passwords, 1);
        assert!(!report.session);

        let users = store.get(USERS_KEY).await?.unwrap();
        assert!(users[0].get("password").is_none());
        assert!(users[0]["password_hash"].as_str().unwrap().starts_with("$argon2"));
        let current = store.get(CURRENT_USER_KEY).await?.unwrap();
        assert!(current.get("password").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn plaintext_admin_overrides_are_hashed() -> Result<(), anyhow::Error> {
        use crate::auth::domain::{AdminOverride, ADMIN_ACCOUNTS};
        use std::collections::HashMap;

        let store = MemoryStore::new();
        let first = ADMIN_ACCOUNTS[0].id.to_string();
        store.set(ADMIN_PASSWORDS_KEY, json!({ first.clone(): "rahasia1" })).await?;

        let report = normalize_legacy_ids(&store).await?;
        assert_eq!(report.admin_overrides, 1);

        let raw = store.get(ADMIN_PASSWORDS_KEY).await?.unwrap();
        let overrides: HashMap<String, AdminOverride> = serde_json::from_value(raw)?;
        assert!(overrides[&first].password_hash.starts_with("$argon2"));

        // a second pass has nothing left to do
        assert!(normalize_legacy_ids(&store).await?.is_empty());
        Ok(())
    }
}
