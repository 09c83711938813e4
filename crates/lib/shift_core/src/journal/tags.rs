//! Per-user tag metadata. Entries reference tags by name, so renames and
//! deletions are carried over to the owner's entries.

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{JournalError, conflict_on_unique};
use crate::models::tag::{NewTag, Tag, TagPatch};
use crate::uuid::uuidv7;

const TAG_COLUMNS: &str = "id, user_id, name, color, description, created_at, updated_at";
const MSG_TAG_EXISTS: &str = "Tag already exists!";

fn tag_not_found() -> JournalError {
    JournalError::NotFound("Tag not found!".into())
}

pub async fn list_tags(pool: &PgPool, user_id: Uuid) -> Result<Vec<Tag>, JournalError> {
    let tags = sqlx::query_as::<_, Tag>(&format!(
        "SELECT {TAG_COLUMNS} FROM tags WHERE user_id = $1 ORDER BY name"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(tags)
}

pub async fn add_tag(pool: &PgPool, user_id: Uuid, new: NewTag) -> Result<Tag, JournalError> {
    let tag = sqlx::query_as::<_, Tag>(&format!(
        "INSERT INTO tags (id, user_id, name, color, description) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {TAG_COLUMNS}"
    ))
    .bind(uuidv7())
    .bind(user_id)
    .bind(new.name.trim())
    .bind(new.color.trim())
    .bind(new.description.as_deref().map(str::trim))
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, MSG_TAG_EXISTS))?;
    debug!(user_id = %user_id, tag_id = %tag.id, "tag added");
    Ok(tag)
}

/// Update a tag. A rename is applied to the owner's entries as well.
pub async fn update_tag(
    pool: &PgPool,
    user_id: Uuid,
    tag_id: Uuid,
    patch: TagPatch,
) -> Result<Tag, JournalError> {
    let mut tx = pool.begin().await?;

    let old_name = sqlx::query_scalar::<_, String>(
        "SELECT name FROM tags WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(tag_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(tag_not_found)?;

    let tag = sqlx::query_as::<_, Tag>(&format!(
        "UPDATE tags SET \
           name = COALESCE($3, name), \
           color = COALESCE($4, color), \
           description = COALESCE($5, description), \
           updated_at = now() \
         WHERE id = $1 AND user_id = $2 RETURNING {TAG_COLUMNS}"
    ))
    .bind(tag_id)
    .bind(user_id)
    .bind(patch.name.as_deref().map(str::trim))
    .bind(patch.color.as_deref().map(str::trim))
    .bind(patch.description.as_deref().map(str::trim))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| conflict_on_unique(e, MSG_TAG_EXISTS))?;

    if tag.name != old_name {
        sqlx::query(
            "UPDATE entries SET tags = array_replace(tags, $2, $3) \
             WHERE user_id = $1 AND $2 = ANY(tags)",
        )
        .bind(user_id)
        .bind(&old_name)
        .bind(&tag.name)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(tag)
}

/// Delete a tag and strip it from the owner's entries.
pub async fn delete_tag(pool: &PgPool, user_id: Uuid, tag_id: Uuid) -> Result<(), JournalError> {
    let mut tx = pool.begin().await?;

    let name = sqlx::query_scalar::<_, String>(
        "DELETE FROM tags WHERE id = $1 AND user_id = $2 RETURNING name",
    )
    .bind(tag_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(tag_not_found)?;

    sqlx::query(
        "UPDATE entries SET tags = array_remove(tags, $2) WHERE user_id = $1 AND $2 = ANY(tags)",
    )
    .bind(user_id)
    .bind(&name)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    debug!(user_id = %user_id, tag_id = %tag_id, "tag deleted");
    Ok(())
}
