//! Application error types.
//!
//! Every failure leaves a handler as an [`AppError`] and is rendered as
//! `{ "message": ..., "stack": ... }`. The stack is attached afterwards by
//! [`crate::middleware::error_stack`] outside production.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shift_core::auth::AuthError;
use shift_core::journal::JournalError;
use thiserror::Error;
use tracing::error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

const MSG_INTERNAL: &str = "Internal server error";

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub stack: Option<String>,
}

/// Attached to error responses so the stack can be filled in later.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
    pub stack: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The client-facing message. Internal details are never exposed here.
    pub fn message(&self) -> String {
        match self {
            AppError::Internal(_) => MSG_INTERNAL.to_string(),
            other => other.to_string(),
        }
    }

    /// Malformed or unknown path identifiers.
    pub fn invalid_id(what: &str) -> Self {
        AppError::NotFound(format!("{what} not found!"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Internal(detail) = &self {
            error!(error = %detail, "request failed");
        }
        let message = self.message();
        let detail = ErrorDetail {
            message: message.clone(),
            stack: format!("{self:?}"),
        };
        let mut response = (
            status,
            Json(ErrorBody {
                message,
                stack: None,
            }),
        )
            .into_response();
        response.extensions_mut().insert(detail);
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Resource already exists".into())
            }
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::CredentialError => AppError::Unauthorized(e.to_string()),
            AuthError::Unauthenticated(msg) => AppError::Unauthorized(msg),
            AuthError::Forbidden(msg) => AppError::Forbidden(msg),
            AuthError::NotFound(msg) => AppError::NotFound(msg),
            AuthError::Conflict(msg) => AppError::Conflict(msg),
            AuthError::ValidationError(msg) => AppError::Validation(msg),
            AuthError::LastSuperAdmin => AppError::Forbidden(e.to_string()),
            AuthError::DbError(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<JournalError> for AppError {
    fn from(e: JournalError) -> Self {
        match e {
            JournalError::NotFound(msg) => AppError::NotFound(msg),
            JournalError::Conflict(msg) => AppError::Conflict(msg),
            JournalError::Validation(msg) => AppError::Validation(msg),
            JournalError::Crypto(e) => AppError::Internal(e.to_string()),
            JournalError::Db(e) => AppError::from(e),
        }
    }
}

/// First message per field, nested structs included, in field order.
fn collect_messages(errors: &ValidationErrors, out: &mut Vec<String>) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));
    for (field, kind) in fields {
        match kind {
            ValidationErrorsKind::Field(errs) => {
                if let Some(err) = errs.first() {
                    out.push(match &err.message {
                        Some(msg) => msg.to_string(),
                        None => format!("{field} is invalid"),
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(nested, out),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect_messages(nested, out);
                }
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_messages(&errors, &mut messages);
        AppError::Validation(messages.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn renders_message_with_null_stack() {
        let response = AppError::NotFound("Entry not found!".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorDetail>().is_some());
        let json = body_json(response).await;
        assert_eq!(json["message"], "Entry not found!");
        assert!(json["stack"].is_null());
    }

    #[tokio::test]
    async fn internal_details_stay_out_of_the_message() {
        let response = AppError::Internal("pool timed out".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["message"], MSG_INTERNAL);
    }

    #[test]
    fn auth_errors_map_to_statuses() {
        let cases = [
            (AuthError::CredentialError, StatusCode::UNAUTHORIZED),
            (AuthError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AuthError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AuthError::Conflict("x".into()), StatusCode::CONFLICT),
            (AuthError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (AuthError::LastSuperAdmin, StatusCode::FORBIDDEN),
            (AuthError::DbError(sqlx::Error::RowNotFound), StatusCode::NOT_FOUND),
            (
                AuthError::DbError(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn credential_error_keeps_its_message() {
        let err = AppError::from(AuthError::CredentialError);
        assert_eq!(err.message(), "Wrong email/username or password!");
    }

    #[test]
    fn journal_errors_map_to_statuses() {
        assert_eq!(
            AppError::from(JournalError::Conflict("Tag already exists!".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(JournalError::Validation("bad".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
