//! User account model and its closed enumerations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account role. Elevated roles may manage other accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum Role {
    #[serde(rename = "super admin")]
    SuperAdmin,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "user")]
    User,
}

impl Role {
    /// Super-admins and admins pass the authorization policy.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super admin",
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for strings outside a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: '{value}'")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "super admin" | "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(UnknownVariant {
                field: "role",
                value: s.to_string(),
            }),
        }
    }
}

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            _ => Err(UnknownVariant {
                field: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// Who soft-deleted an account. Determines the purge grace period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "deletion_actor", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeletionActor {
    User,
    Admin,
}

impl DeletionActor {
    /// Admin deletions: 15 days. Self deletions: 10 days.
    pub fn grace_period(&self) -> Duration {
        match self {
            Self::Admin => Duration::days(15),
            Self::User => Duration::days(10),
        }
    }
}

/// A user account row.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub avatar: Option<String>,
    pub is_verified: bool,
    pub last_online: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub action_token: Option<String>,
    #[serde(skip_serializing)]
    pub action_token_expires_at: Option<DateTime<Utc>>,
    pub suspension_reason: Option<String>,
    pub suspended_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<DeletionActor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// When a soft-deleted account becomes eligible for purging.
    ///
    /// `None` unless the account is soft-deleted with both a timestamp and an actor.
    pub fn purge_due_at(&self) -> Option<DateTime<Utc>> {
        if !self.is_deleted {
            return None;
        }
        match (self.deleted_at, self.deleted_by) {
            (Some(at), Some(by)) => Some(at + by.grace_period()),
            _ => None,
        }
    }

    /// Whether the grace period has fully elapsed at `now` (inclusive).
    pub fn is_purge_due(&self, now: DateTime<Utc>) -> bool {
        self.purge_due_at().is_some_and(|due| due <= now)
    }

    /// Active super-admins count towards the last-super-admin invariant.
    pub fn is_active_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin && !self.is_deleted
    }

    pub fn can_login(&self) -> bool {
        !self.is_deleted && self.status == UserStatus::Active
    }

    pub fn profile(&self) -> PublicProfile {
        PublicProfile {
            fullname: self.fullname.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            role: self.role,
            avatar: self.avatar.clone(),
        }
    }
}

/// The public subset of an account returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub fullname: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub avatar: Option<String>,
}

/// Data required to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub is_verified: bool,
    pub action_token: Option<String>,
    pub action_token_expires_at: Option<DateTime<Utc>>,
}

/// Fields of a user that may change after creation.
///
/// `None` leaves the column untouched. Email and username changes are
/// re-checked for uniqueness; role changes go through the super-admin guard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.fullname.is_none() && self.email.is_none() && self.username.is_none() && self.role.is_none()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn user(role: Role) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            fullname: "Jo Tester".into(),
            email: format!("{}@example.com", Uuid::new_v4().simple()),
            username: format!("u{}", &Uuid::new_v4().simple().to_string()[..10]),
            password_hash: String::new(),
            role,
            status: UserStatus::Active,
            avatar: None,
            is_verified: true,
            last_online: None,
            action_token: None,
            action_token_expires_at: None,
            suspension_reason: None,
            suspended_at: None,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn deleted(role: Role, by: DeletionActor, at: DateTime<Utc>) -> User {
        let mut u = user(role);
        u.is_deleted = true;
        u.deleted_at = Some(at);
        u.deleted_by = Some(by);
        u.status = UserStatus::Suspended;
        u
    }
}
