use axum::{extract::State, Extension, Json};
use tracing::{info, warn};

use service::auth::domain::SessionUser;
use service::profiles::BusinessProfile;

use crate::errors::JsonApiError;
use crate::routes::auth::{ServerState, UserOutput};

/// Every profile owned by a user registered in the admin's jurisdiction.
#[utoipa::path(get, path = "/admin/umkm", tag = "admin", responses((status = 200, description = "OK"), (status = 403, description = "Forbidden")))]
pub async fn list_umkm(State(state): State<ServerState>, Extension(admin): Extension<SessionUser>) -> Json<Vec<BusinessProfile>> {
    let Some(rw) = admin.rw.as_deref() else {
        warn!(user_id = %admin.id, "admin session without jurisdiction");
        return Json(Vec::new());
    };
    let rows = state.services.profiles.list_all(None, Some(rw)).await;
    info!(rw, count = rows.len(), "admin list umkm");
    Json(rows)
}

#[utoipa::path(get, path = "/admin/users", tag = "admin", responses((status = 200, description = "OK"), (status = 403, description = "Forbidden")))]
pub async fn list_users(State(state): State<ServerState>, Extension(admin): Extension<SessionUser>) -> Result<Json<Vec<UserOutput>>, JsonApiError> {
    let Some(rw) = admin.rw.as_deref() else {
        return Ok(Json(Vec::new()));
    };
    let users = state.services.auth.list_users_in_rw(rw).await?;
    Ok(Json(users.into_iter().map(UserOutput::from).collect()))
}
