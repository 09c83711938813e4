//! Journal entry handlers. Every query is scoped to the caller.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{Local, Utc};
use shift_core::journal::{EntryStats, MoodStats, entries, stats};
use shift_core::models::entry::Entry;

use super::path_id;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{AddEntryRequest, EntryListQuery, MessageResponse, UpdateEntryRequest};

const ENTRY: &str = "Entry";

/// `GET /api/entries?page&limit&tag&mood&deleted`
pub async fn list_entries_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Query(query): Query<EntryListQuery>,
) -> AppResult<Json<Vec<Entry>>> {
    let list = entries::list_entries(
        &state.pool,
        &state.cipher,
        user.id,
        &query.filter(),
        query.pagination(),
    )
    .await?;
    Ok(Json(list))
}

/// `GET /api/entries/{entryId}`
pub async fn get_entry_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(entry_id): Path<String>,
) -> AppResult<Json<Entry>> {
    let entry_id = path_id(&entry_id, ENTRY)?;
    let entry = entries::get_entry(&state.pool, &state.cipher, user.id, entry_id).await?;
    Ok(Json(entry))
}

/// `POST /api/entries/add`
pub async fn add_entry_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    ValidJson(body): ValidJson<AddEntryRequest>,
) -> AppResult<(StatusCode, Json<Entry>)> {
    let new = body
        .into_new_entry()
        .ok_or_else(|| AppError::Validation("Mood intensity must be between 1 and 5!".into()))?;
    let entry = entries::add_entry(&state.pool, &state.cipher, user.id, new, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `PATCH /api/entries/update/{entryId}`: only the given fields change.
pub async fn update_entry_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(entry_id): Path<String>,
    ValidJson(body): ValidJson<UpdateEntryRequest>,
) -> AppResult<Json<Entry>> {
    let entry_id = path_id(&entry_id, ENTRY)?;
    let entry =
        entries::update_entry(&state.pool, &state.cipher, user.id, entry_id, body.into()).await?;
    Ok(Json(entry))
}

/// `PATCH /api/entries/soft-delete/{entryId}`
pub async fn soft_delete_entry_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(entry_id): Path<String>,
) -> AppResult<Json<Entry>> {
    let entry_id = path_id(&entry_id, ENTRY)?;
    let entry =
        entries::soft_delete_entry(&state.pool, &state.cipher, user.id, entry_id, Utc::now())
            .await?;
    Ok(Json(entry))
}

/// `PATCH /api/entries/restore/{entryId}`
pub async fn restore_entry_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(entry_id): Path<String>,
) -> AppResult<Json<Entry>> {
    let entry_id = path_id(&entry_id, ENTRY)?;
    let entry = entries::restore_entry(&state.pool, &state.cipher, user.id, entry_id).await?;
    Ok(Json(entry))
}

/// `DELETE /api/entries/{entryId}`
pub async fn delete_entry_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(entry_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let entry_id = path_id(&entry_id, ENTRY)?;
    entries::delete_entry(&state.pool, user.id, entry_id).await?;
    Ok(Json(MessageResponse::new("Entry deleted!")))
}

/// `GET /api/entries/mood-stats`: windows follow the server's local zone.
pub async fn mood_stats_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> AppResult<Json<MoodStats>> {
    let stats = stats::mood_stats(&state.pool, user.id, &Local::now()).await?;
    Ok(Json(stats))
}

/// `GET /api/entries/entry-stats`
pub async fn entry_stats_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> AppResult<Json<EntryStats>> {
    let stats = entries::entry_stats(&state.pool, user.id).await?;
    Ok(Json(stats))
}
