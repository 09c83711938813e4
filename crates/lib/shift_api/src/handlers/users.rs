//! Account request handlers: registration, login, verification, passwords,
//! profile and self-service deletion.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use shift_core::auth::login::LoginRequest as LoginAttempt;
use shift_core::models::user::{PublicProfile, User};
use shift_core::users::account;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ValidJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    AvatarRequest, EmailRequest, LoginRequest, MessageResponse, NewPasswordRequest,
    RegisterRequest, UpdateProfileRequest,
};
use crate::services::client::{client_ip, user_agent};
use crate::services::cookies::{attach_auth_cookies, clear_auth_cookies};

const MSG_EMAIL_SENT: &str = "Email sent, please check your email!";

/// `POST /api/users/register`: create an unverified account.
pub async fn register_handler(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<PublicProfile>)> {
    let user = account::register(&state.pool, &state.outbox, body.into(), Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(user.profile())))
}

/// `POST /api/users/login`: check credentials, set both auth cookies.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    ValidJson(body): ValidJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<PublicProfile>)> {
    let outcome = shift_core::auth::login(
        state.auth_store.as_ref(),
        &state.tokens,
        LoginAttempt {
            identifier: body.identifier.trim(),
            password: &body.password,
            user_agent: user_agent(&headers),
            ip: client_ip(&headers),
        },
        Utc::now(),
    )
    .await?;

    let jar = attach_auth_cookies(
        jar,
        &outcome.access_token,
        Some(&outcome.refresh.token),
        state.config.cookie_secure(),
    );
    Ok((jar, Json(outcome.user.profile())))
}

/// `POST /api/users/logout`: end the session and clear both cookies.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    account::logout(state.auth_store.as_ref(), user.id).await?;
    let jar = clear_auth_cookies(jar, state.config.cookie_secure());
    Ok((jar, Json(MessageResponse::new("Logged out successfully!"))))
}

/// `POST /api/users/verify-account-request`: re-send the verification link.
pub async fn verify_account_request_handler(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<EmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    account::request_verification(&state.pool, &state.outbox, &body.normalized(), Utc::now())
        .await?;
    Ok(Json(MessageResponse::new(MSG_EMAIL_SENT)))
}

/// `GET /api/users/verify-account/{token}`
pub async fn verify_account_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    account::verify_account(&state.pool, &token, Utc::now()).await?;
    Ok(Json(MessageResponse::new("Account verified!")))
}

/// `POST /api/users/change-password-request`: email a reset link.
pub async fn change_password_request_handler(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<EmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    account::request_password_reset(&state.pool, &state.outbox, &body.normalized(), Utc::now())
        .await?;
    Ok(Json(MessageResponse::new(MSG_EMAIL_SENT)))
}

/// `PATCH /api/users/change-password/{token}`: reset via emailed token.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ValidJson(body): ValidJson<NewPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    account::reset_password(&state.pool, &token, &body.new_password, Utc::now()).await?;
    Ok(Json(MessageResponse::new("Password changed!")))
}

/// `PATCH /api/users/change-password`: change the caller's password.
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    ValidJson(body): ValidJson<NewPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    account::change_password(&state.pool, user.id, &body.new_password).await?;
    Ok(Json(MessageResponse::new("Password changed!")))
}

/// `POST /api/users/reactivate-request`: email a reactivation link to a
/// self-deleted account.
pub async fn reactivate_request_handler(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<EmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    account::request_reactivation(&state.pool, &state.outbox, &body.normalized(), Utc::now())
        .await?;
    Ok(Json(MessageResponse::new(MSG_EMAIL_SENT)))
}

/// `GET /api/users/reactivate-account/{token}`
pub async fn reactivate_account_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<PublicProfile>> {
    let user = account::reactivate_account(&state.pool, &token, Utc::now()).await?;
    Ok(Json(user.profile()))
}

/// `GET /api/users/profile`
pub async fn profile_handler(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Json<PublicProfile> {
    Json(user.profile())
}

/// `PATCH /api/users/update-profile`
pub async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    ValidJson(body): ValidJson<UpdateProfileRequest>,
) -> AppResult<Json<User>> {
    let updated = account::update_profile(&state.pool, &user, body.into()).await?;
    Ok(Json(updated))
}

/// `PATCH /api/users/avatar`
pub async fn avatar_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    ValidJson(body): ValidJson<AvatarRequest>,
) -> AppResult<Json<PublicProfile>> {
    let updated = account::set_avatar(&state.pool, user.id, body.avatar_url.trim()).await?;
    Ok(Json(updated.profile()))
}

/// `PATCH /api/users/soft-delete`: deactivate one's own account. It is
/// purged after the grace period unless reactivated.
pub async fn soft_delete_self_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    account::soft_delete_self(&state.pool, user.id, Utc::now()).await?;
    let jar = clear_auth_cookies(jar, state.config.cookie_secure());
    Ok((jar, Json(MessageResponse::new("User temporarily deleted!"))))
}
