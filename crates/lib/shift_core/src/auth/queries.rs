//! Account and session database queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::AuthError;
use super::refresh::IssuedToken;
use crate::models::session::{NewSession, Session};
use crate::models::user::{NewUser, User};
use crate::uuid::uuidv7;

/// Column list matching [`User`]'s `FromRow` layout.
pub(crate) const USER_COLUMNS: &str = "id, fullname, email, username, password_hash, role, status, \
     avatar, is_verified, last_online, action_token, action_token_expires_at, suspension_reason, \
     suspended_at, is_deleted, deleted_at, deleted_by, created_at, updated_at";

const SESSION_COLUMNS: &str =
    "id, user_id, token_hash, expires_at, device_info, ip, created_at, updated_at";

/// Fetch a user by ID.
pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, AuthError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Fetch a user by email or username. An email match wins over a username
/// that happens to spell the same address.
pub async fn find_user_by_identifier(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<User>, AuthError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = lower($1) OR username = $1 \
         ORDER BY (email = lower($1)) DESC LIMIT 1"
    ))
    .bind(identifier.trim())
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Fetch a user by email (case-insensitive).
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AuthError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = lower($1)"
    ))
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Fetch the user holding an email action token.
pub async fn find_user_by_action_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<User>, AuthError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE action_token = $1"
    ))
    .bind(token)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Insert a user and return the stored row.
pub async fn create_user(pool: &PgPool, new: &NewUser) -> Result<User, AuthError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users \
           (fullname, email, username, password_hash, role, is_verified, action_token, action_token_expires_at) \
         VALUES ($1, lower($2), $3, $4, $5, $6, $7, $8) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&new.fullname)
    .bind(&new.email)
    .bind(&new.username)
    .bind(&new.password_hash)
    .bind(new.role)
    .bind(new.is_verified)
    .bind(&new.action_token)
    .bind(new.action_token_expires_at)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

/// Whether an email is registered to anyone other than `except`.
pub async fn email_taken(
    pool: &PgPool,
    email: &str,
    except: Option<Uuid>,
) -> Result<bool, AuthError> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = lower($1) AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(email.trim())
    .bind(except)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

/// Whether a username is registered to anyone other than `except`.
pub async fn username_taken(
    pool: &PgPool,
    username: &str,
    except: Option<Uuid>,
) -> Result<bool, AuthError> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(username.trim())
    .bind(except)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

/// Count all users, deleted or not.
pub async fn user_count(pool: &PgPool) -> Result<i64, AuthError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Store a fresh action token, replacing any previous one.
pub async fn set_action_token(
    pool: &PgPool,
    user_id: Uuid,
    token: &IssuedToken,
) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE users SET action_token = $2, action_token_expires_at = $3, updated_at = now() \
         WHERE id = $1",
    )
    .bind(user_id)
    .bind(&token.token)
    .bind(token.expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Mark an account verified and active, consuming its action token.
pub async fn mark_verified(pool: &PgPool, user_id: Uuid) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE users SET is_verified = TRUE, status = 'active', \
           action_token = NULL, action_token_expires_at = NULL, updated_at = now() \
         WHERE id = $1",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Replace the password hash, consuming any action token.
pub async fn set_password(pool: &PgPool, user_id: Uuid, password_hash: &str) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE users SET password_hash = $2, \
           action_token = NULL, action_token_expires_at = NULL, updated_at = now() \
         WHERE id = $1",
    )
    .bind(user_id)
    .bind(password_hash)
    .execute(pool)
    .await?;
    Ok(())
}

/// Set the avatar URL and return the updated row.
pub async fn set_avatar(pool: &PgPool, user_id: Uuid, avatar: &str) -> Result<User, AuthError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET avatar = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(avatar)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn record_login(pool: &PgPool, user_id: Uuid, at: DateTime<Utc>) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET last_online = $2 WHERE id = $1")
        .bind(user_id)
        .bind(at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Create the user's session or overwrite the existing one.
pub async fn upsert_session(pool: &PgPool, new: &NewSession) -> Result<Session, AuthError> {
    let session = sqlx::query_as::<_, Session>(&format!(
        "INSERT INTO sessions (id, user_id, token_hash, expires_at, device_info, ip) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (user_id) DO UPDATE SET \
           token_hash = EXCLUDED.token_hash, \
           expires_at = EXCLUDED.expires_at, \
           device_info = EXCLUDED.device_info, \
           ip = EXCLUDED.ip, \
           updated_at = now() \
         RETURNING {SESSION_COLUMNS}"
    ))
    .bind(uuidv7())
    .bind(new.user_id)
    .bind(&new.token_hash)
    .bind(new.expires_at)
    .bind(&new.device_info)
    .bind(&new.ip)
    .fetch_one(pool)
    .await?;
    Ok(session)
}

/// Find a session by the hash of its refresh token. Expiry is left to the caller.
pub async fn find_session_by_token_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<Session>, AuthError> {
    let session = sqlx::query_as::<_, Session>(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE token_hash = $1"
    ))
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;
    Ok(session)
}

/// Delete the user's session, if any.
pub async fn delete_session(pool: &PgPool, user_id: Uuid) -> Result<(), AuthError> {
    sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
