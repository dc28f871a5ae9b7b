//! Shared helpers for the UMKM registry crates: logging setup, runtime
//! checks, id parsing, and small response types.

pub mod types;
pub mod utils;
pub mod env;
pub mod ids;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }
}
