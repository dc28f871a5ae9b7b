//! SeaORM entities for the `users`, `user_credentials`, and `umkm` tables,
//! plus validation helpers shared with the local backend.

pub mod errors;
pub mod db;
pub mod user;
pub mod user_credentials;
pub mod umkm;

#[cfg(test)]
mod tests;
