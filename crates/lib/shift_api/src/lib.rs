//! # shift_api
//!
//! HTTP API library for Shift.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use shift_core::auth::{AuthStore, PgAuthStore, TokenService};
use shift_core::crypto::ContentCipher;
use shift_core::mail::{Mailer, Outbox};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{admin, entries, tags, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: Arc<ApiConfig>,
    pub tokens: Arc<TokenService>,
    pub cipher: Arc<ContentCipher>,
    /// Session and user lookups for the authentication gate and login.
    pub auth_store: Arc<dyn AuthStore>,
    pub outbox: Outbox,
}

impl AppState {
    /// Wire the services described by `config` around one pool.
    pub fn new(pool: PgPool, config: ApiConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            tokens: Arc::new(TokenService::new(config.jwt_secret.as_bytes())),
            cipher: Arc::new(ContentCipher::new(&config.content_key)),
            auth_store: Arc::new(PgAuthStore::new(pool.clone())),
            outbox: Outbox::new(mailer, config.app_url.clone()),
            config: Arc::new(config),
            pool,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `shift_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    shift_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::POST_API_USERS_REGISTER, post(users::register_handler))
        .route(routes::POST_API_USERS_LOGIN, post(users::login_handler))
        .route(
            routes::POST_API_USERS_VERIFY_ACCOUNT_REQUEST,
            post(users::verify_account_request_handler),
        )
        .route(
            routes::GET_API_USERS_VERIFY_ACCOUNT_TOKEN,
            get(users::verify_account_handler),
        )
        .route(
            routes::POST_API_USERS_CHANGE_PASSWORD_REQUEST,
            post(users::change_password_request_handler),
        )
        .route(
            routes::PATCH_API_USERS_CHANGE_PASSWORD_TOKEN,
            patch(users::reset_password_handler),
        )
        .route(
            routes::POST_API_USERS_REACTIVATE_REQUEST,
            post(users::reactivate_request_handler),
        )
        .route(
            routes::GET_API_USERS_REACTIVATE_ACCOUNT_TOKEN,
            get(users::reactivate_account_handler),
        );

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::POST_API_USERS_LOGOUT, post(users::logout_handler))
        .route(
            routes::PATCH_API_USERS_CHANGE_PASSWORD,
            patch(users::change_password_handler),
        )
        .route(routes::GET_API_USERS_PROFILE, get(users::profile_handler))
        .route(
            routes::PATCH_API_USERS_UPDATE_PROFILE,
            patch(users::update_profile_handler),
        )
        .route(routes::PATCH_API_USERS_AVATAR, patch(users::avatar_handler))
        .route(
            routes::PATCH_API_USERS_SOFT_DELETE,
            patch(users::soft_delete_self_handler),
        )
        .route(routes::GET_API_ENTRIES, get(entries::list_entries_handler))
        .route(
            routes::GET_API_ENTRIES_MOOD_STATS,
            get(entries::mood_stats_handler),
        )
        .route(
            routes::GET_API_ENTRIES_ENTRY_STATS,
            get(entries::entry_stats_handler),
        )
        .route(
            routes::GET_API_ENTRIES_ENTRYID,
            get(entries::get_entry_handler).delete(entries::delete_entry_handler),
        )
        .route(routes::POST_API_ENTRIES_ADD, post(entries::add_entry_handler))
        .route(
            routes::PATCH_API_ENTRIES_UPDATE_ENTRYID,
            patch(entries::update_entry_handler),
        )
        .route(
            routes::PATCH_API_ENTRIES_SOFT_DELETE_ENTRYID,
            patch(entries::soft_delete_entry_handler),
        )
        .route(
            routes::PATCH_API_ENTRIES_RESTORE_ENTRYID,
            patch(entries::restore_entry_handler),
        )
        .route(routes::GET_API_TAGS, get(tags::list_tags_handler))
        .route(routes::POST_API_TAGS_ADD, post(tags::add_tag_handler))
        .route(
            routes::PATCH_API_TAGS_UPDATE_TAGID,
            patch(tags::update_tag_handler),
        )
        .route(
            routes::DELETE_API_TAGS_DELETE_TAGID,
            delete(tags::delete_tag_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    // Admin routes (require auth + elevated role). Layers run bottom-up, so
    // authentication wraps the role check.
    let admin = Router::new()
        .route(
            routes::POST_API_USERS_CREATE_USER,
            post(admin::create_user_handler),
        )
        .route(routes::GET_API_USERS_GET_USERS, get(admin::list_users_handler))
        .route(
            routes::GET_API_USERS_GET_USERS_USERID,
            get(admin::get_user_handler),
        )
        .route(
            routes::PATCH_API_USERS_UPDATE_USERID,
            patch(admin::update_user_handler),
        )
        .route(
            routes::PATCH_API_USERS_STATUS_USERID,
            patch(admin::set_status_handler),
        )
        .route(
            routes::PATCH_API_USERS_SOFT_DELETE_USERID,
            patch(admin::soft_delete_user_handler),
        )
        .route(
            routes::PATCH_API_USERS_RESTORE_USERID,
            patch(admin::restore_user_handler),
        )
        .route(
            routes::DELETE_API_USERS_USERID,
            delete(admin::hard_delete_user_handler),
        )
        .layer(axum::middleware::from_fn(middleware::rbac::require_elevated))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(admin)
        .fallback(handlers::not_found_handler)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::error_stack::attach_error_stack,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
