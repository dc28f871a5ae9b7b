use axum::{extract::{Request, State}, http::header, middleware::Next, response::Response, Extension};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use service::auth::domain::SessionUser;

use crate::errors::JsonApiError;
use crate::routes::auth::{ServerState, AUTH_COOKIE};

/// Bearer token from `Authorization`, falling back to the `auth_token` cookie.
fn extract_token(req: &Request) -> Result<Option<String>, JsonApiError> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return match h.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(t.trim().to_string())),
            _ => {
                warn!(path = %req.uri().path(), "invalid Authorization format (expect Bearer)");
                Err(JsonApiError::unauthorized("expected a Bearer token"))
            }
        };
    }
    let jar = CookieJar::from_headers(req.headers());
    Ok(jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|t| !t.is_empty()))
}

/// Resolve the session token into a [`SessionUser`] request extension.
/// Missing, invalid, and expired tokens are all 401.
pub async fn require_session(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let Some(token) = extract_token(&req)? else {
        debug!(path = %req.uri().path(), "missing Authorization header and auth_token cookie");
        return Err(JsonApiError::unauthorized("login required"));
    };
    let user = state.services.auth.verify_token(&token).map_err(|e| {
        warn!(path = %req.uri().path(), err = %e, "token validation failed");
        JsonApiError::unauthorized("invalid or expired session")
    })?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Runs inside [`require_session`]; rejects non-admin identities with 403.
pub async fn require_admin(
    Extension(user): Extension<SessionUser>,
    req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    if !user.is_admin() {
        warn!(user_id = %user.id, path = %req.uri().path(), "non-admin on admin route");
        return Err(JsonApiError::forbidden("admin session required"));
    }
    Ok(next.run(req).await)
}
