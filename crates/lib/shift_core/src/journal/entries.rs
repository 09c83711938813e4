//! Journal entry CRUD. Content is encrypted before it reaches the database.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::JournalError;
use crate::crypto::ContentCipher;
use crate::models::entry::{
    Entry, EntryPatch, EntryRecord, MAX_CONTENT_CHARS, Mood, MoodLabel, NewEntry, checked_intensity,
};
use crate::models::page::Pagination;
use crate::uuid::uuidv7;

const ENTRY_COLUMNS: &str =
    "id, user_id, posted_at, mood_label, mood_intensity, content, tags, is_deleted, deleted_at";

fn entry_not_found() -> JournalError {
    JournalError::NotFound("Entry not found!".into())
}

/// List filters. `deleted` switches to the soft-deleted entries only.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub tag: Option<String>,
    pub mood: Option<MoodLabel>,
    pub deleted: bool,
}

/// Entry counts for one user.
#[derive(Debug, Clone, Default, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EntryStats {
    pub total_entries: i64,
    pub active_entries: i64,
    pub deleted_entries: i64,
    pub first_posted_at: Option<DateTime<Utc>>,
    pub last_posted_at: Option<DateTime<Utc>>,
}

fn validate_content(content: &str) -> Result<String, JournalError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(JournalError::Validation("Entry is required".into()));
    }
    if trimmed.chars().count() > MAX_CONTENT_CHARS {
        return Err(JournalError::Validation(format!(
            "Entry must be at most {MAX_CONTENT_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim, drop empties and de-duplicate while keeping first-seen order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

fn decrypt_record(cipher: &ContentCipher, record: EntryRecord) -> Result<Entry, JournalError> {
    let intensity = checked_intensity(i64::from(record.mood_intensity))
        .map_err(|e| JournalError::Validation(e.to_string()))?;
    Ok(Entry {
        id: record.id,
        posted_at: record.posted_at,
        mood: Mood {
            label: record.mood_label,
            intensity,
        },
        entry: cipher.decrypt(&record.content)?,
        tags: record.tags,
        is_deleted: record.is_deleted,
        deleted_at: record.deleted_at,
    })
}

/// The owner's entries, newest first.
pub async fn list_entries(
    pool: &PgPool,
    cipher: &ContentCipher,
    user_id: Uuid,
    filter: &EntryFilter,
    page: Pagination,
) -> Result<Vec<Entry>, JournalError> {
    let records = sqlx::query_as::<_, EntryRecord>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries \
         WHERE user_id = $1 AND is_deleted = $2 \
           AND ($3::text IS NULL OR $3 = ANY(tags)) \
           AND ($4::mood_label IS NULL OR mood_label = $4) \
         ORDER BY posted_at DESC \
         LIMIT $5 OFFSET $6"
    ))
    .bind(user_id)
    .bind(filter.deleted)
    .bind(filter.tag.as_deref())
    .bind(filter.mood)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    records
        .into_iter()
        .map(|r| decrypt_record(cipher, r))
        .collect()
}

pub async fn get_entry(
    pool: &PgPool,
    cipher: &ContentCipher,
    user_id: Uuid,
    entry_id: Uuid,
) -> Result<Entry, JournalError> {
    let record = sqlx::query_as::<_, EntryRecord>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries WHERE id = $1 AND user_id = $2"
    ))
    .bind(entry_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(entry_not_found)?;
    decrypt_record(cipher, record)
}

pub async fn add_entry(
    pool: &PgPool,
    cipher: &ContentCipher,
    user_id: Uuid,
    new: NewEntry,
    now: DateTime<Utc>,
) -> Result<Entry, JournalError> {
    let content = validate_content(&new.content)?;
    let record = sqlx::query_as::<_, EntryRecord>(&format!(
        "INSERT INTO entries (id, user_id, posted_at, mood_label, mood_intensity, content, tags) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {ENTRY_COLUMNS}"
    ))
    .bind(uuidv7())
    .bind(user_id)
    .bind(now)
    .bind(new.mood.label)
    .bind(i16::from(new.mood.intensity))
    .bind(cipher.encrypt(&content)?)
    .bind(normalize_tags(new.tags))
    .fetch_one(pool)
    .await?;
    debug!(user_id = %user_id, entry_id = %record.id, "entry added");
    decrypt_record(cipher, record)
}

/// Apply only the provided fields. New content is re-encrypted.
pub async fn update_entry(
    pool: &PgPool,
    cipher: &ContentCipher,
    user_id: Uuid,
    entry_id: Uuid,
    patch: EntryPatch,
) -> Result<Entry, JournalError> {
    if patch.is_empty() {
        return get_entry(pool, cipher, user_id, entry_id).await;
    }
    let content = match patch.content.as_deref() {
        Some(raw) => Some(cipher.encrypt(&validate_content(raw)?)?),
        None => None,
    };
    let intensity = match patch.mood_intensity {
        Some(i) => Some(i16::from(
            checked_intensity(i64::from(i)).map_err(|e| JournalError::Validation(e.to_string()))?,
        )),
        None => None,
    };

    let record = sqlx::query_as::<_, EntryRecord>(&format!(
        "UPDATE entries SET \
           content = COALESCE($3, content), \
           mood_label = COALESCE($4, mood_label), \
           mood_intensity = COALESCE($5, mood_intensity), \
           tags = COALESCE($6, tags) \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {ENTRY_COLUMNS}"
    ))
    .bind(entry_id)
    .bind(user_id)
    .bind(content)
    .bind(patch.mood_label)
    .bind(intensity)
    .bind(patch.tags.map(normalize_tags))
    .fetch_optional(pool)
    .await?
    .ok_or_else(entry_not_found)?;
    decrypt_record(cipher, record)
}

async fn set_deleted(
    pool: &PgPool,
    cipher: &ContentCipher,
    user_id: Uuid,
    entry_id: Uuid,
    deleted_at: Option<DateTime<Utc>>,
) -> Result<Entry, JournalError> {
    let record = sqlx::query_as::<_, EntryRecord>(&format!(
        "UPDATE entries SET is_deleted = $3, deleted_at = $4 \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {ENTRY_COLUMNS}"
    ))
    .bind(entry_id)
    .bind(user_id)
    .bind(deleted_at.is_some())
    .bind(deleted_at)
    .fetch_optional(pool)
    .await?
    .ok_or_else(entry_not_found)?;
    decrypt_record(cipher, record)
}

pub async fn soft_delete_entry(
    pool: &PgPool,
    cipher: &ContentCipher,
    user_id: Uuid,
    entry_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Entry, JournalError> {
    set_deleted(pool, cipher, user_id, entry_id, Some(now)).await
}

pub async fn restore_entry(
    pool: &PgPool,
    cipher: &ContentCipher,
    user_id: Uuid,
    entry_id: Uuid,
) -> Result<Entry, JournalError> {
    set_deleted(pool, cipher, user_id, entry_id, None).await
}

pub async fn delete_entry(pool: &PgPool, user_id: Uuid, entry_id: Uuid) -> Result<(), JournalError> {
    let result = sqlx::query("DELETE FROM entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(entry_not_found());
    }
    Ok(())
}

pub async fn entry_stats(pool: &PgPool, user_id: Uuid) -> Result<EntryStats, JournalError> {
    let stats = sqlx::query_as::<_, EntryStats>(
        "SELECT \
           COUNT(*) AS total_entries, \
           COUNT(*) FILTER (WHERE NOT is_deleted) AS active_entries, \
           COUNT(*) FILTER (WHERE is_deleted) AS deleted_entries, \
           MIN(posted_at) FILTER (WHERE NOT is_deleted) AS first_posted_at, \
           MAX(posted_at) FILTER (WHERE NOT is_deleted) AS last_posted_at \
         FROM entries WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_trimmed_and_bounded() {
        assert_eq!(validate_content("  hello \n").unwrap(), "hello");
        assert!(validate_content("   ").is_err());
        let max: String = "é".repeat(MAX_CONTENT_CHARS);
        assert!(validate_content(&max).is_ok());
        let over = format!("{max}x");
        assert!(matches!(validate_content(&over), Err(JournalError::Validation(_))));
    }

    #[test]
    fn tags_are_normalized() {
        let tags = vec![" work ".into(), "".into(), "work".into(), "sleep".into()];
        assert_eq!(normalize_tags(tags), vec!["work".to_string(), "sleep".to_string()]);
    }

    #[test]
    fn decrypts_owner_record() {
        let cipher = ContentCipher::new("k");
        let record = EntryRecord {
            id: uuidv7(),
            user_id: uuidv7(),
            posted_at: Utc::now(),
            mood_label: MoodLabel::Happy,
            mood_intensity: 4,
            content: cipher.encrypt("a good day").unwrap(),
            tags: vec!["walk".into()],
            is_deleted: false,
            deleted_at: None,
        };
        let entry = decrypt_record(&cipher, record).unwrap();
        assert_eq!(entry.entry, "a good day");
        assert_eq!(entry.mood, Mood { label: MoodLabel::Happy, intensity: 4 });
    }

    #[test]
    fn corrupt_ciphertext_is_an_error() {
        let cipher = ContentCipher::new("k");
        let record = EntryRecord {
            id: uuidv7(),
            user_id: uuidv7(),
            posted_at: Utc::now(),
            mood_label: MoodLabel::Sad,
            mood_intensity: 2,
            content: ContentCipher::new("other").encrypt("secret").unwrap(),
            tags: vec![],
            is_deleted: false,
            deleted_at: None,
        };
        assert!(matches!(decrypt_record(&cipher, record), Err(JournalError::Crypto(_))));
    }
}
