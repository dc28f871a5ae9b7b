use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use service::auth::errors::AuthError;
use service::errors::ServiceError;

/// `{"error": <title>, "detail": <message>}` with a status code.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail }
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(detail.into()))
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden", Some(detail.into()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = ?self.detail, "{}", self.title);
        }
        let body = ErrorBody { error: self.title, detail: self.detail.as_deref() };
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let detail = Some(e.to_string());
        match e {
            ServiceError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, "Validation Error", detail),
            ServiceError::NotFoundOrForbidden(_) => Self::new(StatusCode::NOT_FOUND, "Not Found", detail),
            ServiceError::NotConfigured(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Not Configured", detail),
            ServiceError::Backend(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Storage Error", detail),
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        let detail = Some(e.to_string());
        match e {
            AuthError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, "Validation Error", detail),
            AuthError::Conflict => Self::new(StatusCode::CONFLICT, "Conflict", detail),
            AuthError::Unauthorized | AuthError::NoSession => Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", detail),
            AuthError::NotFound => Self::new(StatusCode::NOT_FOUND, "Not Found", detail),
            AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Auth Failed", detail)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("storage backend unavailable: {0}")]
    Backend(#[from] ServiceError),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
