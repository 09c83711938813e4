//! Storage seam for the authentication gate and login flow.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AuthError, queries};
use crate::models::session::{NewSession, Session};
use crate::models::user::User;

/// The reads and writes that authentication needs from persistence.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AuthError>;

    /// Look up by email or username.
    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, AuthError>;

    async fn find_session_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, AuthError>;

    /// One row per user: a second login overwrites the first.
    async fn upsert_session(&self, session: NewSession) -> Result<Session, AuthError>;

    async fn delete_session(&self, user_id: Uuid) -> Result<(), AuthError>;

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), AuthError>;
}

/// PostgreSQL-backed [`AuthStore`].
#[derive(Debug, Clone)]
pub struct PgAuthStore {
    pool: PgPool,
}

impl PgAuthStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthStore for PgAuthStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        queries::find_user_by_id(&self.pool, id).await
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, AuthError> {
        queries::find_user_by_identifier(&self.pool, identifier).await
    }

    async fn find_session_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, AuthError> {
        queries::find_session_by_token_hash(&self.pool, token_hash).await
    }

    async fn upsert_session(&self, session: NewSession) -> Result<Session, AuthError> {
        queries::upsert_session(&self.pool, &session).await
    }

    async fn delete_session(&self, user_id: Uuid) -> Result<(), AuthError> {
        queries::delete_session(&self.pool, user_id).await
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), AuthError> {
        queries::record_login(&self.pool, user_id, at).await
    }
}
