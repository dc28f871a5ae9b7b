//! Auth module: three-layer architecture (domain, repository, service), plus
//! the single-slot `SessionManager` built on top of the service.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod session;
pub mod repo;

pub use service::AuthService;
pub use session::SessionManager;
