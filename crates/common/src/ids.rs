//! Identifier helpers.
//!
//! Owner and record ids arrive as strings from callers and from legacy local
//! data; only canonical hyphenated UUIDs are accepted.

use uuid::Uuid;

/// Parse a hyphenated UUID string; anything else (simple, braced, urn forms,
/// blanks, legacy ids such as `user_1699999999`) yields `None`.
pub fn parse_uuid(raw: &str) -> Option<Uuid> {
    let raw = raw.trim();
    if raw.len() != 36 {
        return None;
    }
    Uuid::parse_str(raw).ok()
}

pub fn is_uuid(raw: &str) -> bool {
    parse_uuid(raw).is_some()
}
