//! Request middleware.

pub mod auth;
pub mod error_stack;
pub mod rbac;
