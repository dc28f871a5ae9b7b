//! Storage abstractions for the service layer
//!
//! Local persistence is a string-keyed store of JSON blobs, the server-side
//! stand-in for browser local storage. The same keys are used by every
//! local repository:
//!
//! | key | contents |
//! |---|---|
//! | `umkm_records` | all business profiles |
//! | `registered_users` | the self-registered user registry |
//! | `current_user` | the identity held by the session slot |
//! | `admin_passwords` | admin id → password override |

pub mod kv;
pub mod json_file_store;
pub mod legacy;

pub use json_file_store::JsonFileStore;
pub use kv::{KeyValueStore, MemoryStore};

pub const PROFILES_KEY: &str = "umkm_records";
pub const USERS_KEY: &str = "registered_users";
pub const CURRENT_USER_KEY: &str = "current_user";
pub const ADMIN_PASSWORDS_KEY: &str = "admin_passwords";
