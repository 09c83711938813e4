//! Account management for admins and super-admins.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::guard::{GuardedChange, apply_guarded};
use super::{duplicate_field, restore_account};
use crate::auth::AuthError;
use crate::auth::password::hash_password;
use crate::auth::policy::{authorize_elevated, authorize_management, authorize_role_assignment};
use crate::auth::queries::{self, USER_COLUMNS};
use crate::mail::{EmailKind, Outbox};
use crate::models::page::Pagination;
use crate::models::user::{DeletionActor, NewUser, Role, User, UserPatch, UserStatus};

/// Reason quoted in the deletion notice when the admin gives none.
const DEFAULT_DELETION_REASON: &str = "a violation of our terms of service";

/// An account created by an admin. Pre-verified, no email is sent.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub fullname: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: Role,
}

pub async fn create_user(pool: &PgPool, actor: &User, account: NewAccount) -> Result<User, AuthError> {
    authorize_role_assignment(actor.role, account.role)?;

    if let Some(msg) =
        duplicate_field(pool, Some(&account.email), Some(&account.username), None).await?
    {
        return Err(AuthError::ValidationError(msg.into()));
    }

    let user = queries::create_user(
        pool,
        &NewUser {
            fullname: account.fullname,
            email: account.email,
            username: account.username,
            password_hash: hash_password(&account.password)?,
            role: account.role,
            is_verified: true,
            action_token: None,
            action_token_expires_at: None,
        },
    )
    .await?;

    info!(actor_id = %actor.id, user_id = %user.id, role = %user.role, "user created by admin");
    Ok(user)
}

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern.
fn like_pattern(q: &str) -> String {
    let mut escaped = String::with_capacity(q.len() + 2);
    escaped.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Page through users, optionally filtered by a case-insensitive search
/// across name, email, username, status and role.
pub async fn list_users(
    pool: &PgPool,
    q: Option<&str>,
    page: Pagination,
) -> Result<Vec<User>, AuthError> {
    let pattern = q.map(str::trim).filter(|s| !s.is_empty()).map(like_pattern);
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users \
         WHERE $1::text IS NULL \
            OR fullname ILIKE $1 OR email ILIKE $1 OR username ILIKE $1 \
            OR status::text ILIKE $1 OR replace(role::text, '_', ' ') ILIKE $1 \
         ORDER BY created_at DESC \
         LIMIT $2 OFFSET $3"
    ))
    .bind(pattern)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn get_user(pool: &PgPool, user_id: Uuid) -> Result<User, AuthError> {
    queries::find_user_by_id(pool, user_id)
        .await?
        .ok_or_else(AuthError::user_not_found)
}

/// Edit another account. Role changes need a super-admin and may not demote
/// the last one.
pub async fn update_user(
    pool: &PgPool,
    actor: &User,
    user_id: Uuid,
    patch: UserPatch,
) -> Result<User, AuthError> {
    let target = get_user(pool, user_id).await?;
    authorize_management(actor.role, target.role)?;
    if let Some(role) = patch.role
        && role != target.role
    {
        if actor.role != Role::SuperAdmin {
            return Err(AuthError::Forbidden("Only a super admin can change roles".into()));
        }
        authorize_role_assignment(actor.role, role)?;
    }
    if patch.is_empty() {
        return Ok(target);
    }

    let email = patch.email.as_deref().filter(|e| !e.eq_ignore_ascii_case(&target.email));
    let username = patch.username.as_deref().filter(|u| *u != target.username);
    if let Some(msg) = duplicate_field(pool, email, username, Some(user_id)).await? {
        return Err(AuthError::Conflict(msg.into()));
    }

    let updated = apply_guarded(pool, user_id, GuardedChange::Update(&patch)).await?;
    info!(actor_id = %actor.id, user_id = %user_id, "user updated by admin");
    Ok(updated)
}

/// Suspend or reactivate an account. Suspension also ends its session and
/// may not take out the last active super-admin.
pub async fn set_status(
    pool: &PgPool,
    actor: &User,
    user_id: Uuid,
    status: UserStatus,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<User, AuthError> {
    let target = get_user(pool, user_id).await?;
    authorize_management(actor.role, target.role)?;

    let user = match status {
        UserStatus::Suspended => {
            apply_guarded(pool, user_id, GuardedChange::Suspend { reason, at: now }).await?
        }
        UserStatus::Active => {
            sqlx::query_as::<_, User>(&format!(
                "UPDATE users SET status = 'active', suspension_reason = NULL, \
                   suspended_at = NULL, updated_at = now() \
                 WHERE id = $1 RETURNING {USER_COLUMNS}"
            ))
            .bind(user_id)
            .fetch_one(pool)
            .await?
        }
    };

    info!(actor_id = %actor.id, user_id = %user_id, status = %status, "user status changed");
    Ok(user)
}

/// Soft-delete another account and notify its owner. Purged after 15 days.
pub async fn soft_delete_user(
    pool: &PgPool,
    outbox: &Outbox,
    actor: &User,
    user_id: Uuid,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<User, AuthError> {
    let target = get_user(pool, user_id).await?;
    authorize_management(actor.role, target.role)?;

    let user = apply_guarded(
        pool,
        user_id,
        GuardedChange::SoftDelete {
            by: DeletionActor::Admin,
            at: now,
        },
    )
    .await?;

    let reason = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_DELETION_REASON);
    outbox.dispatch(
        &user.email,
        EmailKind::AccountDeletion {
            reason: reason.to_string(),
        },
    );
    info!(actor_id = %actor.id, user_id = %user_id, "user soft-deleted by admin");
    Ok(user)
}

pub async fn restore_user(pool: &PgPool, actor: &User, user_id: Uuid) -> Result<User, AuthError> {
    let target = get_user(pool, user_id).await?;
    authorize_management(actor.role, target.role)?;
    let user = restore_account(pool, user_id).await?;
    info!(actor_id = %actor.id, user_id = %user_id, "user restored");
    Ok(user)
}

/// Remove an account immediately, skipping the grace period.
pub async fn hard_delete_user(pool: &PgPool, actor: &User, user_id: Uuid) -> Result<User, AuthError> {
    authorize_elevated(actor.role)?;
    let target = get_user(pool, user_id).await?;
    authorize_management(actor.role, target.role)?;
    let removed = apply_guarded(pool, user_id, GuardedChange::HardDelete).await?;
    info!(actor_id = %actor.id, user_id = %user_id, "user hard-deleted");
    Ok(removed)
}
