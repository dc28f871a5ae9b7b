use thiserror::Error;

use models::errors::ModelError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Database backend requested but no connection settings were provided.
    #[error("storage backend not configured: {0}")]
    NotConfigured(String),
    /// Scoped write where no record matches both id and owner.
    #[error("not found or forbidden: {0}")]
    NotFoundOrForbidden(String),
    #[error("validation error: {0}")]
    Validation(String),
    /// The storage backend (database or local files) reported a failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl ServiceError {
    pub fn not_found_or_forbidden(entity: &str) -> Self {
        Self::NotFoundOrForbidden(format!("{} not found for this owner", entity))
    }

    pub fn backend(e: impl std::fmt::Display) -> Self {
        Self::Backend(e.to_string())
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => ServiceError::Validation(msg),
            ModelError::Db(msg) => ServiceError::Backend(msg),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Backend(format!("malformed stored json: {e}"))
    }
}
