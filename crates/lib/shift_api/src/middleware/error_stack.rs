//! Fills in the `stack` field of error bodies outside production.

use axum::{
    Json,
    extract::{Request, State},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::error::{ErrorBody, ErrorDetail};

pub async fn attach_error_stack(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if state.config.is_production() {
        return response;
    }
    let Some(detail) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(CONTENT_LENGTH);
    let body = ErrorBody {
        message: detail.message,
        stack: Some(detail.stack),
    };
    (parts, Json(body)).into_response()
}
