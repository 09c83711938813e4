//! Account lifecycle: self-service flows, admin management and the
//! last-super-admin guard.

pub mod account;
pub mod admin;
pub mod guard;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::auth::queries::{self, USER_COLUMNS};
use crate::models::user::User;

pub use account::Registration;
pub use admin::NewAccount;
pub use guard::{GuardedChange, SUPER_ADMIN_LOCK_KEY, apply_guarded};

pub const MSG_EMAIL_TAKEN: &str = "Email is already taken!";
pub const MSG_USERNAME_TAKEN: &str = "Username is already taken!";
pub const MSG_TOKEN_INVALID: &str = "Token is not valid!";
pub const MSG_TOKEN_EXPIRED: &str = "Token is expired, please try again!";

/// The first taken field among `email` and `username`, ignoring `except`.
pub(crate) async fn duplicate_field(
    pool: &PgPool,
    email: Option<&str>,
    username: Option<&str>,
    except: Option<Uuid>,
) -> Result<Option<&'static str>, AuthError> {
    if let Some(email) = email
        && queries::email_taken(pool, email, except).await?
    {
        return Ok(Some(MSG_EMAIL_TAKEN));
    }
    if let Some(username) = username
        && queries::username_taken(pool, username, except).await?
    {
        return Ok(Some(MSG_USERNAME_TAKEN));
    }
    Ok(None)
}

/// Resolve an emailed action token to its user.
///
/// Unknown tokens are a validation error; expired ones are unauthenticated.
pub(crate) async fn redeem_action_token(
    pool: &PgPool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<User, AuthError> {
    let user = queries::find_user_by_action_token(pool, token)
        .await?
        .ok_or_else(|| AuthError::ValidationError(MSG_TOKEN_INVALID.into()))?;
    if is_action_token_expired(&user, now) {
        return Err(AuthError::Unauthenticated(MSG_TOKEN_EXPIRED.into()));
    }
    Ok(user)
}

fn is_action_token_expired(user: &User, now: DateTime<Utc>) -> bool {
    user.action_token_expires_at.is_none_or(|exp| exp < now)
}

/// Clear the soft-delete flags and reactivate.
pub(crate) async fn restore_account(pool: &PgPool, user_id: Uuid) -> Result<User, AuthError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET is_deleted = FALSE, deleted_at = NULL, deleted_by = NULL, \
           status = 'active', suspension_reason = NULL, suspended_at = NULL, \
           action_token = NULL, action_token_expires_at = NULL, updated_at = now() \
         WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(AuthError::user_not_found)?;
    Ok(user)
}
