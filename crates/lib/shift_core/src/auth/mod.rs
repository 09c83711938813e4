//! Authentication and authorization logic.
//!
//! Token issuance, password hashing, the session store, the per-request
//! authentication gate and the role policy. Shared by `shift_api` and the
//! background jobs.

pub mod device;
pub mod gate;
pub mod jwt;
pub mod login;
pub mod password;
pub mod policy;
pub mod queries;
pub mod refresh;
pub mod store;

use thiserror::Error;

pub use gate::{AuthCookies, GateOutcome, authenticate};
pub use jwt::{AccessTokenState, TokenService};
pub use login::{LoginOutcome, LoginRequest, login};
pub use store::{AuthStore, PgAuthStore};

/// Authentication and account errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Wrong email/username or password!")]
    CredentialError,

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Cannot remove the last super admin!")]
    LastSuperAdmin,

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub(crate) fn user_not_found() -> Self {
        Self::NotFound("User not found!".into())
    }
}
