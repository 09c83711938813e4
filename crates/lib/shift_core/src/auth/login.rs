//! Credential login.

use chrono::{DateTime, Utc};
use tracing::info;

use super::device::DeviceDescriptor;
use super::jwt::TokenService;
use super::password::verify_password;
use super::refresh::{IssuedToken, hash_refresh_token, issue_refresh_token};
use super::store::AuthStore;
use super::AuthError;
use crate::models::auth::Principal;
use crate::models::session::NewSession;
use crate::models::user::User;

#[derive(Debug, Clone)]
pub struct LoginRequest<'a> {
    /// Email or username.
    pub identifier: &'a str,
    pub password: &'a str,
    pub user_agent: Option<&'a str>,
    pub ip: Option<String>,
}

/// A successful login: the user plus both credentials to hand to the client.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
    pub refresh: IssuedToken,
}

/// Check credentials, mint tokens and replace the user's session.
pub async fn login(
    store: &dyn AuthStore,
    tokens: &TokenService,
    request: LoginRequest<'_>,
    now: DateTime<Utc>,
) -> Result<LoginOutcome, AuthError> {
    let user = store
        .find_user_by_identifier(request.identifier)
        .await?
        .ok_or(AuthError::CredentialError)?;

    if !verify_password(request.password, &user.password_hash) {
        return Err(AuthError::CredentialError);
    }

    if user.is_deleted {
        return Err(AuthError::Forbidden("This account has been deleted!".into()));
    }
    if !user.can_login() {
        return Err(AuthError::Forbidden("Your account has been suspended!".into()));
    }

    let access_token = tokens.issue_access_token_at(&Principal::from(&user), now)?;
    let refresh = issue_refresh_token(now);
    let device = DeviceDescriptor::classify(request.user_agent);

    store
        .upsert_session(NewSession {
            user_id: user.id,
            token_hash: hash_refresh_token(&refresh.token),
            expires_at: refresh.expires_at,
            device_info: device.to_string(),
            ip: request.ip,
        })
        .await?;
    store.record_login(user.id, now).await?;

    info!(user_id = %user.id, device = %device, "user logged in");

    Ok(LoginOutcome {
        user,
        access_token,
        refresh,
    })
}
