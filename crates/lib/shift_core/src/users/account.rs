//! Self-service account flows.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::guard::{GuardedChange, apply_guarded};
use super::{duplicate_field, redeem_action_token, restore_account};
use crate::auth::{AuthError, AuthStore};
use crate::auth::password::hash_password;
use crate::auth::queries;
use crate::auth::refresh::issue_action_token;
use crate::mail::{EmailKind, Outbox};
use crate::models::user::{DeletionActor, NewUser, Role, User, UserPatch};

/// A validated sign-up request.
#[derive(Debug, Clone)]
pub struct Registration {
    pub fullname: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Create an unverified account and email its verification link.
///
/// The very first account becomes the super-admin.
pub async fn register(
    pool: &PgPool,
    outbox: &Outbox,
    registration: Registration,
    now: DateTime<Utc>,
) -> Result<User, AuthError> {
    if let Some(msg) = duplicate_field(
        pool,
        Some(&registration.email),
        Some(&registration.username),
        None,
    )
    .await?
    {
        return Err(AuthError::ValidationError(msg.into()));
    }

    let role = if queries::user_count(pool).await? == 0 {
        Role::SuperAdmin
    } else {
        Role::User
    };
    let token = issue_action_token(now);

    let user = queries::create_user(
        pool,
        &NewUser {
            fullname: registration.fullname,
            email: registration.email,
            username: registration.username,
            password_hash: hash_password(&registration.password)?,
            role,
            is_verified: false,
            action_token: Some(token.token.clone()),
            action_token_expires_at: Some(token.expires_at),
        },
    )
    .await?;

    outbox.dispatch(&user.email, EmailKind::VerifyAccount { token: token.token });
    info!(user_id = %user.id, role = %user.role, "user registered");
    Ok(user)
}

async fn user_by_email(pool: &PgPool, email: &str) -> Result<User, AuthError> {
    queries::find_user_by_email(pool, email)
        .await?
        .ok_or_else(AuthError::user_not_found)
}

/// Issue a new verification token and email it.
pub async fn request_verification(
    pool: &PgPool,
    outbox: &Outbox,
    email: &str,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    let user = user_by_email(pool, email).await?;
    let token = issue_action_token(now);
    queries::set_action_token(pool, user.id, &token).await?;
    outbox.dispatch(&user.email, EmailKind::VerifyAccount { token: token.token });
    Ok(())
}

/// Redeem a verification token.
pub async fn verify_account(pool: &PgPool, token: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
    let user = redeem_action_token(pool, token, now).await?;
    queries::mark_verified(pool, user.id).await?;
    info!(user_id = %user.id, "account verified");
    Ok(())
}

/// Issue a password-reset token and email it.
pub async fn request_password_reset(
    pool: &PgPool,
    outbox: &Outbox,
    email: &str,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    let user = user_by_email(pool, email).await?;
    let token = issue_action_token(now);
    queries::set_action_token(pool, user.id, &token).await?;
    outbox.dispatch(&user.email, EmailKind::ChangePassword { token: token.token });
    Ok(())
}

/// Set a new password using an emailed reset token.
pub async fn reset_password(
    pool: &PgPool,
    token: &str,
    new_password: &str,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    let user = redeem_action_token(pool, token, now).await?;
    queries::set_password(pool, user.id, &hash_password(new_password)?).await?;
    info!(user_id = %user.id, "password reset");
    Ok(())
}

/// Set a new password for an authenticated user.
pub async fn change_password(pool: &PgPool, user_id: Uuid, new_password: &str) -> Result<(), AuthError> {
    queries::find_user_by_id(pool, user_id)
        .await?
        .ok_or_else(AuthError::user_not_found)?;
    queries::set_password(pool, user_id, &hash_password(new_password)?).await?;
    info!(user_id = %user_id, "password changed");
    Ok(())
}

/// Update one's own name, email or username. The role is never self-assigned.
pub async fn update_profile(pool: &PgPool, user: &User, patch: UserPatch) -> Result<User, AuthError> {
    let patch = UserPatch { role: None, ..patch };
    if patch.is_empty() {
        return Ok(user.clone());
    }

    let email = patch.email.as_deref().filter(|e| !e.eq_ignore_ascii_case(&user.email));
    let username = patch.username.as_deref().filter(|u| *u != user.username);
    if let Some(msg) = duplicate_field(pool, email, username, Some(user.id)).await? {
        return Err(AuthError::Conflict(msg.into()));
    }

    apply_guarded(pool, user.id, GuardedChange::Update(&patch)).await
}

pub async fn set_avatar(pool: &PgPool, user_id: Uuid, avatar_url: &str) -> Result<User, AuthError> {
    queries::set_avatar(pool, user_id, avatar_url).await
}

/// Soft-delete one's own account. Purged after the 10 day grace period.
pub async fn soft_delete_self(pool: &PgPool, user_id: Uuid, now: DateTime<Utc>) -> Result<User, AuthError> {
    let user = apply_guarded(
        pool,
        user_id,
        GuardedChange::SoftDelete {
            by: DeletionActor::User,
            at: now,
        },
    )
    .await?;
    info!(user_id = %user_id, "user deleted own account");
    Ok(user)
}

/// Drop the user's session. The access token lapses on its own.
pub async fn logout(store: &dyn AuthStore, user_id: Uuid) -> Result<(), AuthError> {
    store.delete_session(user_id).await?;
    info!(user_id = %user_id, "user logged out");
    Ok(())
}

/// Email a reactivation link to a self-deleted account still in its grace period.
pub async fn request_reactivation(
    pool: &PgPool,
    outbox: &Outbox,
    email: &str,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    let user = user_by_email(pool, email).await?;
    ensure_reactivatable(&user, now)?;
    let token = issue_action_token(now);
    queries::set_action_token(pool, user.id, &token).await?;
    outbox.dispatch(&user.email, EmailKind::ReactivateAccount { token: token.token });
    Ok(())
}

/// Redeem a reactivation token, restoring the account.
pub async fn reactivate_account(pool: &PgPool, token: &str, now: DateTime<Utc>) -> Result<User, AuthError> {
    let user = redeem_action_token(pool, token, now).await?;
    ensure_reactivatable(&user, now)?;
    let restored = restore_account(pool, user.id).await?;
    info!(user_id = %user.id, "account reactivated");
    Ok(restored)
}

/// Only self-deletions can be undone by the user, and only before the purge.
fn ensure_reactivatable(user: &User, now: DateTime<Utc>) -> Result<(), AuthError> {
    if !user.is_deleted || user.deleted_by != Some(DeletionActor::User) {
        return Err(AuthError::ValidationError("Account is not deactivated!".into()));
    }
    if user.is_purge_due(now) {
        return Err(AuthError::user_not_found());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::user::fixtures::{deleted, user};

    #[test]
    fn only_self_deleted_accounts_in_grace_can_be_reactivated() {
        let now = Utc::now();
        let recent = deleted(Role::User, DeletionActor::User, now - Duration::days(3));
        assert!(ensure_reactivatable(&recent, now).is_ok());

        let expired = deleted(Role::User, DeletionActor::User, now - Duration::days(10));
        assert!(matches!(ensure_reactivatable(&expired, now), Err(AuthError::NotFound(_))));

        let by_admin = deleted(Role::User, DeletionActor::Admin, now - Duration::days(1));
        assert!(matches!(
            ensure_reactivatable(&by_admin, now),
            Err(AuthError::ValidationError(_))
        ));

        assert!(ensure_reactivatable(&user(Role::User), now).is_err());
    }

    #[tokio::test]
    async fn logout_removes_the_session() {
        use crate::auth::store::memory::MemoryAuthStore;
        use crate::models::session::NewSession;

        let u = user(Role::User);
        let store = MemoryAuthStore::with_user(u.clone());
        store
            .upsert_session(NewSession {
                user_id: u.id,
                token_hash: "hash".into(),
                expires_at: Utc::now() + Duration::days(1),
                device_info: "test".into(),
                ip: None,
            })
            .await
            .unwrap();
        assert_eq!(store.session_count(u.id), 1);

        logout(&store, u.id).await.unwrap();
        assert_eq!(store.session_count(u.id), 0);
    }
}
