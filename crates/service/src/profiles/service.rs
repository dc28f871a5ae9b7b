use std::sync::Arc;

use common::ids::parse_uuid;
use configs::OwnerIdPolicy;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::domain::{BusinessProfile, ProfileInput, ProfilePatch};
use super::repository::ProfileRepository;
use crate::auth::repository::AuthRepository;
use crate::errors::ServiceError;

/// Record store for business profiles.
///
/// Reads never fail: backend errors are logged and come back as an empty
/// list or `None`. Writes propagate every error.
pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
    users: Arc<dyn AuthRepository>,
    owner_policy: OwnerIdPolicy,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileRepository>, users: Arc<dyn AuthRepository>, owner_policy: OwnerIdPolicy) -> Self {
        Self { profiles, users, owner_policy }
    }

    /// List profiles, newest first.
    ///
    /// A jurisdiction takes precedence over an owner filter. A malformed owner
    /// id matches nothing.
    #[instrument(skip(self))]
    pub async fn list_all(&self, owner_id: Option<&str>, jurisdiction: Option<&str>) -> Vec<BusinessProfile> {
        let owners: Option<Vec<Uuid>> = if let Some(rw) = jurisdiction {
            match self.users.list_users_in_rw(rw).await {
                Ok(users) => Some(users.into_iter().map(|u| u.id).collect()),
                Err(e) => {
                    error!(error = %e, rw, "failed to resolve jurisdiction");
                    return Vec::new();
                }
            }
        } else if let Some(owner) = owner_id {
            match parse_uuid(owner) {
                Some(id) => Some(vec![id]),
                None => {
                    debug!(owner, "malformed owner id, nothing to list");
                    return Vec::new();
                }
            }
        } else {
            None
        };

        if owners.as_ref().is_some_and(Vec::is_empty) {
            return Vec::new();
        }
        match self.profiles.list(owners.as_deref()).await {
            Ok(mut rows) => {
                rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                rows
            }
            Err(e) => {
                error!(error = %e, "list_all failed");
                Vec::new()
            }
        }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: ProfileInput, owner_id: &str) -> Result<BusinessProfile, ServiceError> {
        input.validate()?;
        let owner = match (parse_uuid(owner_id), self.owner_policy) {
            (Some(id), _) => id,
            (None, OwnerIdPolicy::Reject) => {
                return Err(ServiceError::Validation(format!("owner id {owner_id:?} is not a valid id")));
            }
            (None, OwnerIdPolicy::Regenerate) => {
                let fresh = Uuid::new_v4();
                warn!(owner_id, replacement = %fresh, "malformed owner id replaced");
                fresh
            }
        };
        let saved = self.profiles.insert(input.into_profile(owner)).await.inspect_err(|e| {
            error!(error = %e, "create failed");
        })?;
        info!(profile_id = %saved.id, user_id = %saved.user_id, "profile_created");
        Ok(saved)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &str, patch: ProfilePatch, owner_id: &str) -> Result<BusinessProfile, ServiceError> {
        let (Some(id), Some(owner)) = (parse_uuid(id), parse_uuid(owner_id)) else {
            return Err(ServiceError::not_found_or_forbidden("profile"));
        };
        patch.validate()?;
        let updated = self.profiles.update(id, owner, &patch).await.inspect_err(|e| {
            error!(error = %e, "update failed");
        })?;
        match updated {
            Some(p) => {
                info!(profile_id = %p.id, "profile_updated");
                Ok(p)
            }
            None => Err(ServiceError::not_found_or_forbidden("profile")),
        }
    }

    /// Returns `true` once the record is gone.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str, owner_id: &str) -> Result<bool, ServiceError> {
        let (Some(id), Some(owner)) = (parse_uuid(id), parse_uuid(owner_id)) else {
            return Err(ServiceError::not_found_or_forbidden("profile"));
        };
        let removed = self.profiles.delete(id, owner).await.inspect_err(|e| {
            error!(error = %e, "delete failed");
        })?;
        if !removed {
            return Err(ServiceError::not_found_or_forbidden("profile"));
        }
        info!(profile_id = %id, "profile_deleted");
        Ok(true)
    }

    /// `None` when missing, owned by someone else, or on backend failure.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str, owner_id: Option<&str>) -> Option<BusinessProfile> {
        let owner = match owner_id {
            Some(raw) => Some(parse_uuid(raw)?),
            None => None,
        };
        let id = parse_uuid(id)?;
        match self.profiles.get(id).await {
            Ok(found) => found.filter(|p| owner.map_or(true, |o| p.user_id == o)),
            Err(e) => {
                error!(error = %e, "get_by_id failed");
                None
            }
        }
    }
}
