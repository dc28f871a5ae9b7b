//! Service layer for the UMKM registry.
//! - Business profiles (`profiles`) and accounts/sessions (`auth`) as
//!   framework-independent services over repository traits.
//! - Database and local-file implementations of every repository, chosen
//!   once in `backend`.

pub mod errors;
pub mod auth;
pub mod profiles;
pub mod storage;
pub mod backend;
#[cfg(test)]
pub mod test_support;

pub use backend::{BackendKind, Backends, Services};
