//! Helpers shared by the handlers.

pub mod client;
pub mod cookies;
