//! Role gate for admin routes. Runs after [`super::auth::require_auth`].

use axum::{extract::Request, middleware::Next, response::Response};
use shift_core::auth::gate::MSG_LOGIN_REQUIRED;
use shift_core::auth::policy::authorize_elevated;

use super::auth::AuthenticatedUser;
use crate::error::AppError;

/// Admins and super-admins only; everyone else gets 403.
pub async fn require_elevated(request: Request, next: Next) -> Result<Response, AppError> {
    let role = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|AuthenticatedUser(user)| user.role)
        .ok_or_else(|| AppError::Unauthorized(MSG_LOGIN_REQUIRED.into()))?;
    authorize_elevated(role)?;
    Ok(next.run(request).await)
}
