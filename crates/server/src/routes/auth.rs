use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::types::Outcome;
use service::auth::domain::{AuthUser, LoginInput, RegisterInput, Role, SessionUser};
use service::Services;

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub services: Services,
}

#[derive(Debug, Serialize)]
pub struct UserOutput {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub rw: Option<String>,
}

impl From<AuthUser> for UserOutput {
    fn from(u: AuthUser) -> Self {
        Self { id: u.id, username: u.username, display_name: u.display_name, role: u.role, rw: u.rw }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginOutput {
    pub user: SessionUser,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordInput {
    pub old_password: String,
    pub new_password: String,
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(State(state): State<ServerState>, Json(input): Json<RegisterInput>) -> Result<(StatusCode, Json<UserOutput>), JsonApiError> {
    let user = state.services.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, Json(input): Json<LoginInput>) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state.services.auth.login(input).await?;
    let token = session
        .token
        .ok_or_else(|| JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Auth Failed", Some("token generation failed".into())))?;
    let mut cookie = Cookie::new(AUTH_COOKIE, token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    Ok((jar.add(cookie), Json(LoginOutput { user: session.user, token })))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Logged Out")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current identity"), (status = 401, description = "Unauthorized")))]
pub async fn me(Extension(user): Extension<SessionUser>) -> Json<SessionUser> {
    Json(user)
}

#[utoipa::path(post, path = "/auth/change-password", tag = "auth", request_body = crate::openapi::ChangePasswordRequest, responses((status = 200, description = "Changed"), (status = 400, description = "Bad Request"), (status = 401, description = "Unauthorized")))]
pub async fn change_password(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Json(input): Json<ChangePasswordInput>,
) -> Result<Json<Outcome>, JsonApiError> {
    state.services.auth.change_password(&user, &input.old_password, &input.new_password).await?;
    Ok(Json(Outcome::ok("password changed")))
}
