//! Domain models.
//!
//! Internal domain types shared by `shift_api` and the background jobs.
//! API payloads derive their JSON shape from these via `serde`.

pub mod auth;
pub mod entry;
pub mod page;
pub mod session;
pub mod tag;
pub mod user;

pub use auth::{Principal, TokenClaims};
pub use entry::{Entry, EntryPatch, EntryRecord, Mood, MoodLabel, NewEntry};
pub use page::Pagination;
pub use session::{NewSession, Session};
pub use tag::{NewTag, Tag, TagPatch};
pub use user::{DeletionActor, NewUser, PublicProfile, Role, User, UserPatch, UserStatus};
