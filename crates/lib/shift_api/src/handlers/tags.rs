//! Tag handlers. Tags belong to the caller; names are unique per user.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use shift_core::journal::tags;
use shift_core::models::tag::Tag;

use super::path_id;
use crate::AppState;
use crate::error::AppResult;
use crate::extract::ValidJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{AddTagRequest, MessageResponse, UpdateTagRequest};

const TAG: &str = "Tag";

/// `GET /api/tags`
pub async fn list_tags_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<Tag>>> {
    Ok(Json(tags::list_tags(&state.pool, user.id).await?))
}

/// `POST /api/tags/add`
pub async fn add_tag_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    ValidJson(body): ValidJson<AddTagRequest>,
) -> AppResult<(StatusCode, Json<Tag>)> {
    let tag = tags::add_tag(&state.pool, user.id, body.into()).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// `PATCH /api/tags/update/{tagId}`: a rename also retags the caller's entries.
pub async fn update_tag_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(tag_id): Path<String>,
    ValidJson(body): ValidJson<UpdateTagRequest>,
) -> AppResult<Json<Tag>> {
    let tag_id = path_id(&tag_id, TAG)?;
    let tag = tags::update_tag(&state.pool, user.id, tag_id, body.into()).await?;
    Ok(Json(tag))
}

/// `DELETE /api/tags/delete/{tagId}`
pub async fn delete_tag_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(tag_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    tags::delete_tag(&state.pool, user.id, path_id(&tag_id, TAG)?).await?;
    Ok(Json(MessageResponse::new("Tag deleted!")))
}
