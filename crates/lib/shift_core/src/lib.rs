//! # shift_core
//!
//! Core domain logic for Shift: accounts and sessions, the journal
//! (entries, tags, mood statistics), content encryption, mail and the
//! retention sweeper.

pub mod auth;
pub mod clock;
pub mod crypto;
pub mod journal;
pub mod mail;
pub mod migrate;
pub mod models;
pub mod retention;
pub mod users;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
