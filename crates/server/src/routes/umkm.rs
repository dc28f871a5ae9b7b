use axum::{extract::{Path, State}, http::StatusCode, Extension, Json};
use tracing::info;

use service::auth::domain::SessionUser;
use service::profiles::{BusinessProfile, ProfileInput, ProfilePatch};

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

#[utoipa::path(get, path = "/umkm", tag = "umkm", responses((status = 200, description = "Profiles owned by the session user, newest first"), (status = 401, description = "Unauthorized")))]
pub async fn list(State(state): State<ServerState>, Extension(user): Extension<SessionUser>) -> Json<Vec<BusinessProfile>> {
    let owner = user.id.to_string();
    let rows = state.services.profiles.list_all(Some(&owner), None).await;
    info!(user_id = %user.id, count = rows.len(), "list umkm");
    Json(rows)
}

#[utoipa::path(post, path = "/umkm", tag = "umkm", request_body = crate::openapi::ProfileInputDoc, responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"), (status = 500, description = "Create Failed")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Json(input): Json<ProfileInput>,
) -> Result<(StatusCode, Json<BusinessProfile>), JsonApiError> {
    let created = state.services.profiles.create(input, &user.id.to_string()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/umkm/{id}", tag = "umkm", params(("id" = String, Path, description = "Profile id")), responses((status = 200, description = "Found"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Json<BusinessProfile>, JsonApiError> {
    state
        .services
        .profiles
        .get_by_id(&id, Some(&user.id.to_string()))
        .await
        .map(Json)
        .ok_or_else(|| JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some(format!("no profile {id} for this user"))))
}

#[utoipa::path(put, path = "/umkm/{id}", tag = "umkm", params(("id" = String, Path, description = "Profile id")), request_body = crate::openapi::ProfilePatchDoc, responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<BusinessProfile>, JsonApiError> {
    let updated = state.services.profiles.update(&id, patch, &user.id.to_string()).await?;
    Ok(Json(updated))
}

#[utoipa::path(delete, path = "/umkm/{id}", tag = "umkm", params(("id" = String, Path, description = "Profile id")), responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    state.services.profiles.delete(&id, &user.id.to_string()).await?;
    Ok(StatusCode::NO_CONTENT)
}
