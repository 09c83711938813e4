//! Per-request authentication gate.
//!
//! Resolves the two auth cookies to a user. Checks run in order and the
//! first match decides:
//!
//! 1. no refresh cookie: 401, whatever the access cookie holds
//! 2. a principal is already attached: pass through
//! 3. valid access token: load its user (404 if gone)
//! 4. expired but authentic access token: load its user and mint a new
//!    access token; the refresh cookie is left alone
//! 5. otherwise: find the session by refresh token, reject missing or
//!    expired sessions, load the owner and mint a new access token
//!
//! Any unexpected failure in step 5 is reported as 401.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::jwt::{AccessTokenState, TokenService};
use super::refresh::hash_refresh_token;
use super::store::AuthStore;
use super::AuthError;
use crate::models::auth::{Principal, TokenClaims};
use crate::models::user::User;

pub const MSG_LOGIN_REQUIRED: &str = "Authentication required. Please login.";
pub const MSG_INVALID_SESSION: &str = "Invalid session";
pub const MSG_SESSION_EXPIRED: &str = "Session expired! please login again.";
pub const MSG_INVALID_REFRESH: &str = "Invalid refresh token!";

/// The auth cookies carried by a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthCookies<'a> {
    pub access_token: Option<&'a str>,
    pub refresh_token: Option<&'a str>,
}

impl<'a> AuthCookies<'a> {
    fn refresh(&self) -> Option<&'a str> {
        self.refresh_token.filter(|t| !t.is_empty())
    }

    fn access(&self) -> Option<&'a str> {
        self.access_token.filter(|t| !t.is_empty())
    }
}

/// Result of running the gate.
#[derive(Debug, Clone)]
pub enum GateOutcome {
    /// A principal was attached earlier in the chain.
    AlreadyResolved,
    Authenticated {
        user: User,
        /// Set when a new access cookie must be written to the response.
        renewed_access_token: Option<String>,
    },
}

/// Resolve a request's cookies to an authenticated user.
pub async fn authenticate(
    store: &dyn AuthStore,
    tokens: &TokenService,
    cookies: AuthCookies<'_>,
    already_resolved: bool,
    now: DateTime<Utc>,
) -> Result<GateOutcome, AuthError> {
    let Some(refresh_token) = cookies.refresh() else {
        return Err(AuthError::Unauthenticated(MSG_LOGIN_REQUIRED.into()));
    };

    if already_resolved {
        return Ok(GateOutcome::AlreadyResolved);
    }

    if let Some(access_token) = cookies.access() {
        match tokens.inspect(access_token) {
            AccessTokenState::Valid(claims) => {
                if let Some(user) = user_for_claims(store, &claims).await? {
                    return Ok(GateOutcome::Authenticated {
                        user,
                        renewed_access_token: None,
                    });
                }
            }
            AccessTokenState::Expired(claims) => {
                if let Some(user) = user_for_claims(store, &claims).await? {
                    let renewed = tokens.issue_access_token_at(&Principal::from(&user), now)?;
                    debug!(user_id = %user.id, "renewed expired access token");
                    return Ok(GateOutcome::Authenticated {
                        user,
                        renewed_access_token: Some(renewed),
                    });
                }
            }
            AccessTokenState::Invalid => {
                debug!("access token rejected, falling back to session");
            }
        }
    }

    match resolve_session(store, tokens, refresh_token, now).await {
        Ok(outcome) => Ok(outcome),
        Err(e @ (AuthError::Unauthenticated(_) | AuthError::NotFound(_))) => Err(e),
        Err(e) => {
            warn!(error = %e, "session lookup failed");
            Err(AuthError::Unauthenticated(MSG_INVALID_REFRESH.into()))
        }
    }
}

/// Load the token's user. `Ok(None)` means the subject is not a user id,
/// which sends the request down the session path.
async fn user_for_claims(
    store: &dyn AuthStore,
    claims: &TokenClaims,
) -> Result<Option<User>, AuthError> {
    let Some(user_id) = claims.user_id() else {
        return Ok(None);
    };
    match store.find_user(user_id).await? {
        Some(user) => Ok(Some(user)),
        None => Err(AuthError::user_not_found()),
    }
}

async fn resolve_session(
    store: &dyn AuthStore,
    tokens: &TokenService,
    refresh_token: &str,
    now: DateTime<Utc>,
) -> Result<GateOutcome, AuthError> {
    let session = store
        .find_session_by_token_hash(&hash_refresh_token(refresh_token))
        .await?
        .ok_or_else(|| AuthError::Unauthenticated(MSG_INVALID_SESSION.into()))?;

    if session.is_expired(now) {
        return Err(AuthError::Unauthenticated(MSG_SESSION_EXPIRED.into()));
    }

    let user = store
        .find_user(session.user_id)
        .await?
        .ok_or_else(AuthError::user_not_found)?;

    let renewed = tokens.issue_access_token_at(&Principal::from(&user), now)?;
    Ok(GateOutcome::Authenticated {
        user,
        renewed_access_token: Some(renewed),
    })
}
