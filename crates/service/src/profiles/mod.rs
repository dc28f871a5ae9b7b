//! Business profile records (UMKM), scoped by owner or jurisdiction.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;

pub use domain::{BusinessProfile, ProfileInput, ProfilePatch};
pub use repository::ProfileRepository;
pub use service::ProfileService;
