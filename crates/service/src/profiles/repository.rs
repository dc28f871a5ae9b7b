use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{BusinessProfile, ProfilePatch};
use crate::errors::ServiceError;

/// Persistence for business profiles. Scoped operations match on id AND owner.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Newest first. `None` lists everything, `Some(&[])` nothing.
    async fn list(&self, owners: Option<&[Uuid]>) -> Result<Vec<BusinessProfile>, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<BusinessProfile>, ServiceError>;
    async fn insert(&self, profile: BusinessProfile) -> Result<BusinessProfile, ServiceError>;
    /// `None` when no record has this id under this owner.
    async fn update(&self, id: Uuid, owner: Uuid, patch: &ProfilePatch) -> Result<Option<BusinessProfile>, ServiceError>;
    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<bool, ServiceError>;
}
