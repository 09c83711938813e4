//! Authentication middleware: cookie extraction and the session gate.

use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use shift_core::auth::{AuthCookies, GateOutcome, authenticate};
use shift_core::models::user::User;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::{ACCESS_COOKIE, REFRESH_COOKIE, access_cookie};

/// The resolved principal, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Axum middleware: resolves the `accessToken` / `refreshToken` cookies to a
/// user and injects `AuthenticatedUser` into request extensions.
///
/// When the gate renews the access token the new cookie is appended to the
/// response, unless the handler already wrote one (logout clears it).
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let jar = CookieJar::from_headers(request.headers());
    let cookies = AuthCookies {
        access_token: jar.get(ACCESS_COOKIE).map(Cookie::value),
        refresh_token: jar.get(REFRESH_COOKIE).map(Cookie::value),
    };
    let already_resolved = request.extensions().get::<AuthenticatedUser>().is_some();

    let outcome = authenticate(
        state.auth_store.as_ref(),
        &state.tokens,
        cookies,
        already_resolved,
        Utc::now(),
    )
    .await?;

    let renewed = match outcome {
        GateOutcome::AlreadyResolved => None,
        GateOutcome::Authenticated {
            user,
            renewed_access_token,
        } => {
            request.extensions_mut().insert(AuthenticatedUser(user));
            renewed_access_token
        }
    };

    let response = next.run(request).await;
    match renewed {
        Some(token) if !sets_cookie(&response, ACCESS_COOKIE) => {
            let jar = CookieJar::new().add(access_cookie(&token, state.config.cookie_secure()));
            Ok((jar, response).into_response())
        }
        _ => Ok(response),
    }
}

fn sets_cookie(response: &Response, name: &str) -> bool {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}
