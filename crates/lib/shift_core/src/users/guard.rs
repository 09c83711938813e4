//! Last-super-admin guard.
//!
//! Every change that can take a super-admin out of service runs inside one
//! transaction holding a PostgreSQL advisory lock, so the "count the other
//! super-admins, then act" sequence cannot interleave with another guarded
//! change (including the retention sweeper).

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::warn;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::auth::queries::USER_COLUMNS;
use crate::models::user::{DeletionActor, Role, User, UserPatch};

/// Advisory lock serialising all guarded user changes.
pub const SUPER_ADMIN_LOCK_KEY: i64 = 0x5348_4946_5401;

/// A change that may remove a super-admin.
#[derive(Debug, Clone)]
pub enum GuardedChange<'a> {
    SoftDelete {
        by: DeletionActor,
        at: DateTime<Utc>,
    },
    HardDelete,
    Suspend {
        reason: Option<&'a str>,
        at: DateTime<Utc>,
    },
    Update(&'a UserPatch),
}

impl GuardedChange<'_> {
    /// Whether applying this change to `target` takes away a super-admin.
    pub fn removes_super_admin(&self, target: &User) -> bool {
        if target.role != Role::SuperAdmin {
            return false;
        }
        match self {
            Self::SoftDelete { .. } | Self::HardDelete | Self::Suspend { .. } => true,
            Self::Update(patch) => patch.role.is_some_and(|r| r != Role::SuperAdmin),
        }
    }
}

/// Reject a change that would leave no active super-admin.
pub fn check_last_super_admin(
    target: &User,
    change: &GuardedChange<'_>,
    other_active_super_admins: i64,
) -> Result<(), AuthError> {
    if change.removes_super_admin(target) && other_active_super_admins == 0 {
        return Err(AuthError::LastSuperAdmin);
    }
    Ok(())
}

/// Apply `change` to `user_id` under the guard.
///
/// Returns the row after the change, or the removed row for a hard delete.
pub async fn apply_guarded(
    pool: &PgPool,
    user_id: Uuid,
    change: GuardedChange<'_>,
) -> Result<User, AuthError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SUPER_ADMIN_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    let target = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
    ))
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(AuthError::user_not_found)?;

    if change.removes_super_admin(&target) {
        let others = count_other_active_super_admins(&mut tx, user_id).await?;
        if let Err(e) = check_last_super_admin(&target, &change, others) {
            warn!(user_id = %user_id, "refusing to remove the last super admin");
            return Err(e);
        }
    }

    let result = match change {
        GuardedChange::SoftDelete { by, at } => soft_delete(&mut tx, user_id, by, at).await?,
        GuardedChange::HardDelete => {
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            target
        }
        GuardedChange::Suspend { reason, at } => suspend(&mut tx, user_id, reason, at).await?,
        GuardedChange::Update(patch) => update(&mut tx, user_id, patch).await?,
    };

    tx.commit().await?;
    Ok(result)
}

async fn count_other_active_super_admins(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<i64, AuthError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users \
         WHERE role = 'super_admin' AND status = 'active' AND NOT is_deleted AND id <> $1",
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(count)
}

async fn soft_delete(
    conn: &mut PgConnection,
    user_id: Uuid,
    by: DeletionActor,
    at: DateTime<Utc>,
) -> Result<User, AuthError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET is_deleted = TRUE, deleted_at = $2, deleted_by = $3, \
           status = 'suspended', updated_at = now() \
         WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(at)
    .bind(by)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(user)
}

async fn suspend(
    conn: &mut PgConnection,
    user_id: Uuid,
    reason: Option<&str>,
    at: DateTime<Utc>,
) -> Result<User, AuthError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET status = 'suspended', suspension_reason = $2, suspended_at = $3, \
           updated_at = now() \
         WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(reason)
    .bind(at)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(user)
}

async fn update(
    conn: &mut PgConnection,
    user_id: Uuid,
    patch: &UserPatch,
) -> Result<User, AuthError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET \
           fullname = COALESCE($2, fullname), \
           email = COALESCE(lower($3), email), \
           username = COALESCE($4, username), \
           role = COALESCE($5, role), \
           updated_at = now() \
         WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(&patch.fullname)
    .bind(&patch.email)
    .bind(&patch.username)
    .bind(patch.role)
    .fetch_one(conn)
    .await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::fixtures::user;

    fn soft() -> GuardedChange<'static> {
        GuardedChange::SoftDelete {
            by: DeletionActor::User,
            at: Utc::now(),
        }
    }

    #[test]
    fn sole_super_admin_cannot_be_removed() {
        let sa = user(Role::SuperAdmin);
        assert!(matches!(
            check_last_super_admin(&sa, &soft(), 0),
            Err(AuthError::LastSuperAdmin)
        ));
        assert!(matches!(
            check_last_super_admin(&sa, &GuardedChange::HardDelete, 0),
            Err(AuthError::LastSuperAdmin)
        ));
    }

    #[test]
    fn super_admin_with_a_peer_can_be_removed() {
        let sa = user(Role::SuperAdmin);
        assert!(check_last_super_admin(&sa, &soft(), 1).is_ok());
        assert!(check_last_super_admin(&sa, &GuardedChange::HardDelete, 2).is_ok());
    }

    #[test]
    fn suspending_the_sole_super_admin_is_refused() {
        let sa = user(Role::SuperAdmin);
        let suspend = GuardedChange::Suspend {
            reason: Some("audit"),
            at: Utc::now(),
        };
        assert!(matches!(
            check_last_super_admin(&sa, &suspend, 0),
            Err(AuthError::LastSuperAdmin)
        ));
        assert!(check_last_super_admin(&sa, &suspend, 1).is_ok());
        assert!(check_last_super_admin(&user(Role::Admin), &suspend, 0).is_ok());
    }

    #[test]
    fn other_roles_are_never_guarded() {
        let admin = user(Role::Admin);
        assert!(check_last_super_admin(&admin, &GuardedChange::HardDelete, 0).is_ok());
    }

    #[test]
    fn demotion_is_guarded_but_other_edits_are_not() {
        let sa = user(Role::SuperAdmin);
        let demote = UserPatch {
            role: Some(Role::Admin),
            ..Default::default()
        };
        let rename = UserPatch {
            fullname: Some("New Name".into()),
            ..Default::default()
        };
        let keep = UserPatch {
            role: Some(Role::SuperAdmin),
            ..Default::default()
        };
        assert!(check_last_super_admin(&sa, &GuardedChange::Update(&demote), 0).is_err());
        assert!(check_last_super_admin(&sa, &GuardedChange::Update(&rename), 0).is_ok());
        assert!(check_last_super_admin(&sa, &GuardedChange::Update(&keep), 0).is_ok());
    }
}
