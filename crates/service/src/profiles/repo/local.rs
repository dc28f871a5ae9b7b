use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::profiles::domain::{BusinessProfile, ProfilePatch};
use crate::profiles::repository::ProfileRepository;
use crate::storage::kv::{self, KeyValueStore};
use crate::storage::PROFILES_KEY;

/// Profiles kept as one JSON array under `umkm_records`.
pub struct LocalProfileRepository {
    store: Arc<dyn KeyValueStore>,
}

impl LocalProfileRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn all(&self) -> Result<Vec<BusinessProfile>, ServiceError> {
        Ok(kv::load(self.store.as_ref(), PROFILES_KEY).await?.unwrap_or_default())
    }
}

#[async_trait]
impl ProfileRepository for LocalProfileRepository {
    async fn list(&self, owners: Option<&[Uuid]>) -> Result<Vec<BusinessProfile>, ServiceError> {
        let mut rows: Vec<BusinessProfile> = self
            .all()
            .await?
            .into_iter()
            .filter(|p| owners.map_or(true, |o| o.contains(&p.user_id)))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<BusinessProfile>, ServiceError> {
        Ok(self.all().await?.into_iter().find(|p| p.id == id))
    }

    async fn insert(&self, profile: BusinessProfile) -> Result<BusinessProfile, ServiceError> {
        let saved = profile.clone();
        kv::modify(self.store.as_ref(), PROFILES_KEY, move |rows: &mut Vec<BusinessProfile>| {
            if rows.iter().any(|p| p.id == profile.id) {
                return Err(ServiceError::Backend(format!("duplicate profile id {}", profile.id)));
            }
            rows.push(profile);
            Ok(())
        })
        .await?;
        Ok(saved)
    }

    async fn update(&self, id: Uuid, owner: Uuid, patch: &ProfilePatch) -> Result<Option<BusinessProfile>, ServiceError> {
        let patch = patch.clone();
        kv::modify(self.store.as_ref(), PROFILES_KEY, move |rows: &mut Vec<BusinessProfile>| {
            Ok(rows.iter_mut().find(|p| p.id == id && p.user_id == owner).map(|p| {
                patch.apply(p);
                p.updated_at = Utc::now();
                p.clone()
            }))
        })
        .await
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<bool, ServiceError> {
        kv::modify(self.store.as_ref(), PROFILES_KEY, move |rows: &mut Vec<BusinessProfile>| {
            let before = rows.len();
            rows.retain(|p| !(p.id == id && p.user_id == owner));
            Ok(rows.len() != before)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::domain::ProfileInput;
    use crate::storage::MemoryStore;

    fn input(name: &str) -> ProfileInput {
        ProfileInput {
            name: name.into(),
            owner_name: "Budi".into(),
            business_type: "Kerajinan".into(),
            status: "aktif".into(),
            ..ProfileInput::default()
        }
    }

    #[tokio::test]
    async fn persists_under_profiles_key() -> Result<(), anyhow::Error> {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let repo = LocalProfileRepository::new(store.clone());
        let saved = repo.insert(input("Anyaman").into_profile(Uuid::new_v4())).await?;

        let raw = store.get(PROFILES_KEY).await?.unwrap();
        assert_eq!(raw.as_array().map(Vec::len), Some(1));
        assert_eq!(repo.get(saved.id).await?, Some(saved));
        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete_require_matching_owner() -> Result<(), anyhow::Error> {
        let repo = LocalProfileRepository::new(Arc::new(MemoryStore::new()));
        let owner = Uuid::new_v4();
        let saved = repo.insert(input("Anyaman").into_profile(owner)).await?;
        let patch = ProfilePatch { name: Some("Anyaman Bambu".into()), ..ProfilePatch::default() };

        assert!(repo.update(saved.id, Uuid::new_v4(), &patch).await?.is_none());
        assert!(!repo.delete(saved.id, Uuid::new_v4()).await?);

        let updated = repo.update(saved.id, owner, &patch).await?.unwrap();
        assert_eq!(updated.name, "Anyaman Bambu");
        assert!(updated.updated_at >= saved.updated_at);
        assert!(repo.delete(saved.id, owner).await?);
        assert!(repo.list(None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn list_is_newest_first() -> Result<(), anyhow::Error> {
        let repo = LocalProfileRepository::new(Arc::new(MemoryStore::new()));
        let owner = Uuid::new_v4();
        let mut old = input("Lama").into_profile(owner);
        old.created_at -= chrono::Duration::hours(1);
        repo.insert(old).await?;
        repo.insert(input("Baru").into_profile(Uuid::new_v4())).await?;

        let names: Vec<_> = repo.list(None).await?.into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Baru", "Lama"]);
        assert_eq!(repo.list(Some(&[owner])).await?.len(), 1);
        Ok(())
    }
}
