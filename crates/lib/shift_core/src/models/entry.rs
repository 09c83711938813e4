//! Journal entry model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Maximum entry length in characters.
pub const MAX_CONTENT_CHARS: usize = 5000;

/// Lowest and highest mood intensity.
pub const MIN_INTENSITY: u8 = 1;
pub const MAX_INTENSITY: u8 = 5;

/// Five-point mood scale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "mood_label", rename_all = "snake_case")]
pub enum MoodLabel {
    #[serde(rename = "very sad")]
    VerySad,
    #[serde(rename = "sad")]
    Sad,
    #[serde(rename = "fine")]
    Fine,
    #[serde(rename = "happy")]
    Happy,
    #[serde(rename = "very happy")]
    VeryHappy,
}

impl MoodLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerySad => "very sad",
            Self::Sad => "sad",
            Self::Fine => "fine",
            Self::Happy => "happy",
            Self::VeryHappy => "very happy",
        }
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mood intensity must be between 1 and 5, got {0}")]
pub struct IntensityOutOfRange(pub i64);

/// A labelled mood with an intensity in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mood {
    pub label: MoodLabel,
    pub intensity: u8,
}

impl Mood {
    pub fn new(label: MoodLabel, intensity: i64) -> Result<Self, IntensityOutOfRange> {
        Ok(Self {
            label,
            intensity: checked_intensity(intensity)?,
        })
    }
}

pub fn checked_intensity(value: i64) -> Result<u8, IntensityOutOfRange> {
    if (i64::from(MIN_INTENSITY)..=i64::from(MAX_INTENSITY)).contains(&value) {
        Ok(value as u8)
    } else {
        Err(IntensityOutOfRange(value))
    }
}

/// An entry row as stored: `content` is ciphertext.
#[derive(Debug, Clone, FromRow)]
pub struct EntryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub posted_at: DateTime<Utc>,
    pub mood_label: MoodLabel,
    pub mood_intensity: i16,
    pub content: String,
    pub tags: Vec<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An entry as returned to its owner, with decrypted content.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub posted_at: DateTime<Utc>,
    pub mood: Mood,
    pub entry: String,
    pub tags: Vec<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub content: String,
    pub mood: Mood,
    pub tags: Vec<String>,
}

/// Mutable entry fields. Content changes are re-encrypted before writing.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub content: Option<String>,
    pub mood_label: Option<MoodLabel>,
    pub mood_intensity: Option<u8>,
    pub tags: Option<Vec<String>>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.mood_label.is_none()
            && self.mood_intensity.is_none()
            && self.tags.is_none()
    }
}
