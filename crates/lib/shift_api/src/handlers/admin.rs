//! Admin user-management handlers. Mounted behind the auth and role gates.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use shift_core::models::user::{PublicProfile, User};
use shift_core::users::admin;
use validator::Validate;

use super::path_id;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    CreateUserRequest, MessageResponse, SoftDeleteRequest, StatusRequest, UpdateProfileRequest,
    UserListQuery,
};

const USER: &str = "User";

/// `POST /api/users/create-user`: a pre-verified account, no email sent.
pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    ValidJson(body): ValidJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<PublicProfile>)> {
    let user = admin::create_user(&state.pool, &actor, body.into()).await?;
    Ok((StatusCode::CREATED, Json(user.profile())))
}

/// `GET /api/users/get-users?page&limit&q`
pub async fn list_users_handler(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<Vec<User>>> {
    let users = admin::list_users(&state.pool, query.q.as_deref(), query.pagination()).await?;
    Ok(Json(users))
}

/// `GET /api/users/get-users/{userId}`
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<User>> {
    let user = admin::get_user(&state.pool, path_id(&user_id, USER)?).await?;
    Ok(Json(user))
}

/// `PATCH /api/users/update/{userId}`
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
    ValidJson(body): ValidJson<UpdateProfileRequest>,
) -> AppResult<Json<User>> {
    let user_id = path_id(&user_id, USER)?;
    let user = admin::update_user(&state.pool, &actor, user_id, body.into()).await?;
    Ok(Json(user))
}

/// `PATCH /api/users/status/{userId}`: suspend or reactivate.
pub async fn set_status_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
    ValidJson(body): ValidJson<StatusRequest>,
) -> AppResult<Json<User>> {
    let user_id = path_id(&user_id, USER)?;
    let user = admin::set_status(
        &state.pool,
        &actor,
        user_id,
        body.status,
        body.reason.as_deref(),
        Utc::now(),
    )
    .await?;
    Ok(Json(user))
}

/// `PATCH /api/users/soft-delete/{userId}`: the `{ reason }` body is optional.
pub async fn soft_delete_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> AppResult<Json<MessageResponse>> {
    let user_id = path_id(&user_id, USER)?;
    let reason = if body.is_empty() {
        None
    } else {
        let request: SoftDeleteRequest = serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?;
        request.validate()?;
        request.reason
    };
    admin::soft_delete_user(
        &state.pool,
        &state.outbox,
        &actor,
        user_id,
        reason.as_deref(),
        Utc::now(),
    )
    .await?;
    Ok(Json(MessageResponse::new("User temporarily deleted!")))
}

/// `PATCH /api/users/restore/{userId}`
pub async fn restore_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
) -> AppResult<Json<User>> {
    let user = admin::restore_user(&state.pool, &actor, path_id(&user_id, USER)?).await?;
    Ok(Json(user))
}

/// `DELETE /api/users/{userId}`: immediate, permanent removal.
pub async fn hard_delete_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    admin::hard_delete_user(&state.pool, &actor, path_id(&user_id, USER)?).await?;
    Ok(Json(MessageResponse::new("User deleted!")))
}
