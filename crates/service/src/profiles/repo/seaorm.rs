use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use models::umkm;

use crate::errors::ServiceError;
use crate::profiles::domain::{BusinessProfile, ProfilePatch};
use crate::profiles::repository::ProfileRepository;

pub struct SeaOrmProfileRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmProfileRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait]
impl ProfileRepository for SeaOrmProfileRepository {
    async fn list(&self, owners: Option<&[Uuid]>) -> Result<Vec<BusinessProfile>, ServiceError> {
        if owners.is_some_and(|o| o.is_empty()) {
            return Ok(Vec::new());
        }
        let rows = umkm::list(&self.db, owners).await?;
        Ok(rows.into_iter().map(BusinessProfile::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<BusinessProfile>, ServiceError> {
        let row = umkm::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(ServiceError::backend)?;
        Ok(row.map(BusinessProfile::from))
    }

    async fn insert(&self, profile: BusinessProfile) -> Result<BusinessProfile, ServiceError> {
        let row = umkm::insert(&self.db, profile.into()).await?;
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, owner: Uuid, patch: &ProfilePatch) -> Result<Option<BusinessProfile>, ServiceError> {
        let row = umkm::update_owned(&self.db, id, owner, |am| patch.apply_to_active(am)).await?;
        Ok(row.map(BusinessProfile::from))
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<bool, ServiceError> {
        Ok(umkm::delete_owned(&self.db, id, owner).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::domain::ProfileInput;
    use crate::test_support::get_db;

    fn input(name: &str) -> ProfileInput {
        ProfileInput {
            name: name.into(),
            owner_name: "Sari".into(),
            business_type: "Makanan".into(),
            status: "aktif".into(),
            ..ProfileInput::default()
        }
    }

    #[tokio::test]
    async fn scoped_update_and_delete() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmProfileRepository::new(db);
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let saved = repo.insert(input("Warung Sari").into_profile(owner)).await?;

        let patch = ProfilePatch { status: Some("tutup".into()), ..ProfilePatch::default() };
        assert!(repo.update(saved.id, stranger, &patch).await?.is_none());
        let updated = repo.update(saved.id, owner, &patch).await?.unwrap();
        assert_eq!(updated.status, "tutup");
        assert!(updated.updated_at >= saved.updated_at);

        assert!(!repo.delete(saved.id, stranger).await?);
        assert!(repo.delete(saved.id, owner).await?);
        assert!(repo.get(saved.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn list_filters_by_owner_set() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmProfileRepository::new(db);
        let owner = Uuid::new_v4();
        repo.insert(input("Satu").into_profile(owner)).await?;
        repo.insert(input("Dua").into_profile(owner)).await?;

        let mine = repo.list(Some(&[owner])).await?;
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].name, "Dua");
        assert!(repo.list(Some(&[])).await?.is_empty());
        Ok(())
    }
}
