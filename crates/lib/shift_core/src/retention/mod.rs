//! Retention sweeper: purges soft-deleted accounts past their grace period.
//!
//! A tick fetches up to [`SWEEP_BATCH_LIMIT`] due accounts and hard-deletes
//! them one at a time through the last-super-admin guard. Per-account
//! failures are counted and logged without stopping the batch, and a failed
//! fetch ends the tick quietly.

mod schedule;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::auth::queries::USER_COLUMNS;
use crate::clock::Clock;
use crate::models::user::{DeletionActor, User};
use crate::users::guard::{GuardedChange, apply_guarded};

pub use schedule::{SWEEP_SCHEDULE, schedule_daily_sweep};

/// Most accounts purged per tick.
pub const SWEEP_BATCH_LIMIT: i64 = 100;

/// Persistence used by the sweeper.
#[async_trait]
pub trait RetentionStore: Send + Sync {
    /// Soft-deleted accounts whose grace period ended at or before `now`.
    async fn fetch_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<User>, AuthError>;

    /// Hard-delete under the guard. Fails with [`AuthError::LastSuperAdmin`]
    /// when the account is the last active super-admin's.
    async fn purge(&self, user_id: Uuid) -> Result<(), AuthError>;
}

/// Counts from one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub deleted: usize,
    pub skipped: usize,
    pub errored: usize,
}

pub struct RetentionSweeper {
    store: Arc<dyn RetentionStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RetentionSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetentionSweeper").finish_non_exhaustive()
    }
}

impl RetentionSweeper {
    pub fn new(store: Arc<dyn RetentionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Run one tick.
    pub async fn sweep(&self) -> SweepReport {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        let candidates = match self.store.fetch_due(now, SWEEP_BATCH_LIMIT).await {
            Ok(users) => users,
            Err(e) => {
                error!(error = %e, "retention sweep could not fetch candidates");
                return report;
            }
        };

        for user in candidates
            .iter()
            .filter(|u| u.is_purge_due(now))
            .take(SWEEP_BATCH_LIMIT as usize)
        {
            match self.store.purge(user.id).await {
                Ok(()) => {
                    report.deleted += 1;
                    info!(user_id = %user.id, deleted_by = ?user.deleted_by, "purged deleted account");
                }
                Err(AuthError::LastSuperAdmin) => {
                    report.skipped += 1;
                    warn!(user_id = %user.id, "skipped purge of the last super admin");
                }
                Err(e) => {
                    report.errored += 1;
                    error!(user_id = %user.id, error = %e, "failed to purge account");
                }
            }
        }

        info!(
            deleted = report.deleted,
            skipped = report.skipped,
            errored = report.errored,
            "retention sweep finished"
        );
        report
    }
}

/// PostgreSQL-backed [`RetentionStore`].
#[derive(Debug, Clone)]
pub struct PgRetentionStore {
    pool: PgPool,
}

impl PgRetentionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RetentionStore for PgRetentionStore {
    async fn fetch_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<User>, AuthError> {
        let admin_cutoff = now - DeletionActor::Admin.grace_period();
        let self_cutoff = now - DeletionActor::User.grace_period();
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE is_deleted \
               AND ((deleted_by = 'admin' AND deleted_at <= $1) \
                 OR (deleted_by = 'user' AND deleted_at <= $2)) \
             ORDER BY deleted_at \
             LIMIT $3"
        ))
        .bind(admin_cutoff)
        .bind(self_cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn purge(&self, user_id: Uuid) -> Result<(), AuthError> {
        apply_guarded(&self.pool, user_id, GuardedChange::HardDelete).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Duration;

    use super::*;
    use crate::clock::FixedClock;
    use crate::models::user::Role;
    use crate::models::user::fixtures::{deleted, user};
    use crate::users::guard::check_last_super_admin;

    /// Mirrors the guarded delete against an in-memory table.
    #[derive(Default)]
    struct MemoryRetentionStore {
        users: Mutex<HashMap<Uuid, User>>,
        failing: Mutex<Vec<Uuid>>,
        fetch_fails: bool,
    }

    impl MemoryRetentionStore {
        fn with(users: impl IntoIterator<Item = User>) -> Self {
            let store = Self::default();
            store
                .users
                .lock()
                .unwrap()
                .extend(users.into_iter().map(|u| (u.id, u)));
            store
        }

        fn contains(&self, id: Uuid) -> bool {
            self.users.lock().unwrap().contains_key(&id)
        }
    }

    #[async_trait]
    impl RetentionStore for MemoryRetentionStore {
        async fn fetch_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<User>, AuthError> {
            if self.fetch_fails {
                return Err(AuthError::DbError(sqlx::Error::PoolTimedOut));
            }
            let mut due: Vec<User> = self
                .users
                .lock()
                .unwrap()
                .values()
                .filter(|u| u.is_purge_due(now))
                .cloned()
                .collect();
            due.sort_by_key(|u| u.deleted_at);
            due.truncate(limit as usize);
            Ok(due)
        }

        async fn purge(&self, user_id: Uuid) -> Result<(), AuthError> {
            if self.failing.lock().unwrap().contains(&user_id) {
                return Err(AuthError::Internal("disk on fire".into()));
            }
            let mut users = self.users.lock().unwrap();
            let target = users.get(&user_id).cloned().ok_or_else(AuthError::user_not_found)?;
            let others = users
                .values()
                .filter(|u| u.id != user_id && u.is_active_super_admin())
                .count() as i64;
            check_last_super_admin(&target, &GuardedChange::HardDelete, others)?;
            users.remove(&user_id);
            Ok(())
        }
    }

    fn sweeper(store: Arc<MemoryRetentionStore>, now: DateTime<Utc>) -> RetentionSweeper {
        RetentionSweeper::new(store, Arc::new(FixedClock(now)))
    }

    #[tokio::test]
    async fn respects_grace_periods_inclusively() {
        let now = Utc::now();
        let admin_due = deleted(Role::User, DeletionActor::Admin, now - Duration::days(15));
        let admin_early = deleted(
            Role::User,
            DeletionActor::Admin,
            now - Duration::days(15) + Duration::seconds(1),
        );
        let self_due = deleted(Role::User, DeletionActor::User, now - Duration::days(10));
        let self_early = deleted(Role::User, DeletionActor::User, now - Duration::days(9));
        let live = user(Role::User);

        let store = Arc::new(MemoryRetentionStore::with([
            admin_due.clone(),
            admin_early.clone(),
            self_due.clone(),
            self_early.clone(),
            live.clone(),
        ]));
        let report = sweeper(store.clone(), now).sweep().await;

        assert_eq!(report, SweepReport { deleted: 2, skipped: 0, errored: 0 });
        assert!(!store.contains(admin_due.id));
        assert!(!store.contains(self_due.id));
        assert!(store.contains(admin_early.id));
        assert!(store.contains(self_early.id));
        assert!(store.contains(live.id));
    }

    #[tokio::test]
    async fn never_purges_the_last_super_admin() {
        let now = Utc::now();
        let sole = deleted(Role::SuperAdmin, DeletionActor::User, now - Duration::days(30));
        let store = Arc::new(MemoryRetentionStore::with([sole.clone()]));
        let report = sweeper(store.clone(), now).sweep().await;
        assert_eq!(report, SweepReport { deleted: 0, skipped: 1, errored: 0 });
        assert!(store.contains(sole.id));
    }

    #[tokio::test]
    async fn purges_super_admin_when_another_is_active() {
        let now = Utc::now();
        let leaving = deleted(Role::SuperAdmin, DeletionActor::User, now - Duration::days(30));
        let staying = user(Role::SuperAdmin);
        let store = Arc::new(MemoryRetentionStore::with([leaving.clone(), staying.clone()]));
        let report = sweeper(store.clone(), now).sweep().await;
        assert_eq!(report.deleted, 1);
        assert!(!store.contains(leaving.id));
        assert!(store.contains(staying.id));
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let now = Utc::now();
        let a = deleted(Role::User, DeletionActor::Admin, now - Duration::days(20));
        let b = deleted(Role::User, DeletionActor::Admin, now - Duration::days(19));
        let store = Arc::new(MemoryRetentionStore::with([a.clone(), b.clone()]));
        store.failing.lock().unwrap().push(a.id);
        let report = sweeper(store.clone(), now).sweep().await;
        assert_eq!(report, SweepReport { deleted: 1, skipped: 0, errored: 1 });
        assert!(store.contains(a.id));
        assert!(!store.contains(b.id));
    }

    #[tokio::test]
    async fn batch_is_bounded() {
        let now = Utc::now();
        let many: Vec<User> = (0..(SWEEP_BATCH_LIMIT + 5))
            .map(|i| deleted(Role::User, DeletionActor::User, now - Duration::days(11) - Duration::minutes(i)))
            .collect();
        let store = Arc::new(MemoryRetentionStore::with(many));
        let report = sweeper(store.clone(), now).sweep().await;
        assert_eq!(report.deleted, SWEEP_BATCH_LIMIT as usize);
        assert_eq!(store.users.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn fetch_failure_ends_tick_quietly() {
        let store = Arc::new(MemoryRetentionStore {
            fetch_fails: true,
            ..Default::default()
        });
        let report = sweeper(store, Utc::now()).sweep().await;
        assert_eq!(report, SweepReport::default());
    }
}
