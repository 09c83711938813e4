//! The journal: entries, tags and mood statistics.
//!
//! Every query is scoped by owner. A row that exists but belongs to someone
//! else is reported exactly like a missing one.

pub mod entries;
pub mod stats;
pub mod tags;

use thiserror::Error;

use crate::crypto::CryptoError;

pub use entries::{EntryFilter, EntryStats};
pub use stats::{LabelTotals, MoodStats, MoodSummary, StatWindows, TimeWindow};

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Map a unique-constraint violation to a conflict, anything else to `Db`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> JournalError {
    if let sqlx::Error::Database(db) = &err
        && db.is_unique_violation()
    {
        return JournalError::Conflict(message.to_string());
    }
    JournalError::Db(err)
}
