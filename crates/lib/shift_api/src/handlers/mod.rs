//! Request handlers.

pub mod admin;
pub mod entries;
pub mod tags;
pub mod users;

use axum::http::Uri;
use shift_core::uuid::parse_id;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Fallback for unmatched routes.
pub async fn not_found_handler(uri: Uri) -> AppError {
    AppError::NotFound(format!("Not Found - {uri}"))
}

/// Parse a path identifier. Malformed ids are reported as missing.
pub(crate) fn path_id(raw: &str, what: &str) -> AppResult<Uuid> {
    parse_id(raw).ok_or_else(|| AppError::invalid_id(what))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn malformed_ids_are_not_found() {
        let err = path_id("65f1c2e4a9b0c1d2e3f4a5b6", "Entry").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Entry not found!");
        assert!(path_id(&Uuid::now_v7().to_string(), "Entry").is_ok());
    }
}
