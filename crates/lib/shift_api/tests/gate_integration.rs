//! Integration test: drive the router through the auth, role and error-stack
//! middleware with an in-memory session store. Only routes that never reach
//! the database are exercised, so the pool is created lazily and never used.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{COOKIE, SET_COOKIE, USER_AGENT};
use axum::http::{Request, Response, StatusCode};
use chrono::{DateTime, Duration, Utc};
use shift_api::AppState;
use shift_api::config::{ApiConfig, Environment};
use shift_core::auth::password::hash_password;
use shift_core::auth::refresh::{hash_refresh_token, issue_refresh_token};
use shift_core::auth::{AuthError, AuthStore};
use shift_core::mail::LogMailer;
use shift_core::models::auth::Principal;
use shift_core::models::session::{NewSession, Session};
use shift_core::models::user::{Role, User, UserStatus};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

const PASSWORD: &str = "Secret1!";

#[derive(Default)]
struct MemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, AuthError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == identifier.to_lowercase() || u.username == identifier)
            .cloned())
    }

    async fn find_session_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, AuthError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.token_hash == token_hash)
            .cloned())
    }

    async fn upsert_session(&self, new: NewSession) -> Result<Session, AuthError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::now_v7(),
            user_id: new.user_id,
            token_hash: new.token_hash,
            expires_at: new.expires_at,
            device_info: new.device_info,
            ip: new.ip,
            created_at: now,
            updated_at: now,
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(session.user_id, session.clone());
        Ok(session)
    }

    async fn delete_session(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.sessions.lock().unwrap().remove(&user_id);
        Ok(())
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), AuthError> {
        if let Some(u) = self.users.lock().unwrap().get_mut(&user_id) {
            u.last_online = Some(at);
        }
        Ok(())
    }
}

fn make_user(username: &str, role: Role) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        fullname: "Test Person".into(),
        email: format!("{username}@example.com"),
        username: username.into(),
        password_hash: hash_password(PASSWORD).unwrap(),
        role,
        status: UserStatus::Active,
        avatar: None,
        is_verified: true,
        last_online: None,
        action_token: None,
        action_token_expires_at: None,
        suspension_reason: None,
        suspended_at: None,
        is_deleted: false,
        deleted_at: None,
        deleted_by: None,
        created_at: now,
        updated_at: now,
    }
}

struct Harness {
    app: axum::Router,
    state: AppState,
    store: Arc<MemoryStore>,
}

impl Harness {
    fn new(environment: Environment) -> Self {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:5432/shift_test")
            .expect("lazy pool");
        let config = ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            pg_connection_url: "postgres://localhost:5432/shift_test".into(),
            environment,
            jwt_secret: "integration-secret".into(),
            content_key: "integration-key".into(),
            app_url: "http://localhost:3000".parse().unwrap(),
            smtp: None,
        };
        let store = Arc::new(MemoryStore::default());
        let state = AppState {
            auth_store: store.clone(),
            ..AppState::new(pool, config, Arc::new(LogMailer))
        };
        Self {
            app: shift_api::router(state.clone()),
            state,
            store,
        }
    }

    fn add_user(&self, user: &User) {
        self.store.users.lock().unwrap().insert(user.id, user.clone());
    }

    /// Store a live session for `user` and return the raw refresh token.
    async fn open_session(&self, user: &User) -> String {
        let refresh = issue_refresh_token(Utc::now());
        self.store
            .upsert_session(NewSession {
                user_id: user.id,
                token_hash: hash_refresh_token(&refresh.token),
                expires_at: refresh.expires_at,
                device_info: "test".into(),
                ip: None,
            })
            .await
            .unwrap();
        refresh.token
    }

    fn access_token(&self, user: &User, issued_at: DateTime<Utc>) -> String {
        self.state
            .tokens
            .issue_access_token_at(&Principal::from(user), issued_at)
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.expect("request")
    }
}

fn get(uri: &str, cookies: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if !cookies.is_empty() {
        let header = cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        builder = builder.header(COOKIE, header);
    }
    builder.body(Body::empty()).unwrap()
}

fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

async fn json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("parse JSON")
}

#[tokio::test]
async fn no_cookies_is_unauthenticated_with_error_body() {
    let h = Harness::new(Environment::Development);
    let resp = h.send(get("/api/users/profile", &[])).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = json(resp).await;
    assert_eq!(body["message"], "Authentication required. Please login.");
    assert!(body["stack"].is_string(), "stack is shown outside production");
}

#[tokio::test]
async fn production_hides_the_stack() {
    let h = Harness::new(Environment::Production);
    let resp = h.send(get("/api/users/profile", &[])).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = json(resp).await;
    assert!(body["stack"].is_null());
}

#[tokio::test]
async fn access_token_without_refresh_cookie_is_rejected() {
    let h = Harness::new(Environment::Test);
    let user = make_user("plainuser", Role::User);
    h.add_user(&user);
    let access = h.access_token(&user, Utc::now());
    let resp = h.send(get("/api/users/profile", &[("accessToken", &access)])).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_access_token_reaches_the_handler_without_renewal() {
    let h = Harness::new(Environment::Test);
    let user = make_user("plainuser", Role::User);
    h.add_user(&user);
    let refresh = h.open_session(&user).await;
    let access = h.access_token(&user, Utc::now());

    let resp = h
        .send(get(
            "/api/users/profile",
            &[("accessToken", &access), ("refreshToken", &refresh)],
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(set_cookies(&resp).is_empty());
    let body = json(resp).await;
    assert_eq!(body["username"], "plainuser");
    assert_eq!(body["email"], "plainuser@example.com");
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn expired_access_token_is_silently_renewed() {
    let h = Harness::new(Environment::Test);
    let user = make_user("plainuser", Role::User);
    h.add_user(&user);
    let refresh = h.open_session(&user).await;
    let stale = h.access_token(&user, Utc::now() - Duration::hours(1));

    let resp = h
        .send(get(
            "/api/users/profile",
            &[("accessToken", &stale), ("refreshToken", &refresh)],
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookies = set_cookies(&resp);
    assert_eq!(cookies.len(), 1, "only the access cookie is rewritten");
    assert!(cookies[0].starts_with("accessToken="));
    assert!(cookies[0].contains("HttpOnly"));
    assert!(cookies[0].contains("SameSite=Strict"));
    assert!(cookies[0].contains("Secure"));
    assert_eq!(json(resp).await["username"], "plainuser");
}

#[tokio::test]
async fn refresh_cookie_alone_restores_the_session() {
    let h = Harness::new(Environment::Test);
    let user = make_user("plainuser", Role::User);
    h.add_user(&user);
    let refresh = h.open_session(&user).await;

    let resp = h
        .send(get("/api/users/profile", &[("refreshToken", &refresh)]))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(set_cookies(&resp)[0].starts_with("accessToken="));
}

#[tokio::test]
async fn unknown_refresh_token_is_unauthenticated() {
    let h = Harness::new(Environment::Test);
    let resp = h
        .send(get("/api/users/profile", &[("refreshToken", "not-a-session")]))
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(resp).await["message"], "Invalid session");
}

#[tokio::test]
async fn plain_users_are_kept_out_of_admin_routes() {
    let h = Harness::new(Environment::Test);
    let user = make_user("plainuser", Role::User);
    h.add_user(&user);
    let refresh = h.open_session(&user).await;
    let access = h.access_token(&user, Utc::now());

    let resp = h
        .send(get(
            "/api/users/get-users",
            &[("accessToken", &access), ("refreshToken", &refresh)],
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(json(resp).await["message"], "Unauthorized access");
}

#[tokio::test]
async fn malformed_user_id_is_not_found_for_admins() {
    let h = Harness::new(Environment::Test);
    let admin = make_user("adminuser", Role::Admin);
    h.add_user(&admin);
    let refresh = h.open_session(&admin).await;
    let access = h.access_token(&admin, Utc::now());

    let resp = h
        .send(get(
            "/api/users/get-users/65f1c2e4a9b0c1d2e3f4a5b6",
            &[("accessToken", &access), ("refreshToken", &refresh)],
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(resp).await["message"], "User not found!");
}

#[tokio::test]
async fn login_sets_both_cookies_and_replaces_the_session() {
    let h = Harness::new(Environment::Test);
    let user = make_user("plainuser", Role::User);
    h.add_user(&user);

    let login = |ua: &'static str| {
        Request::builder()
            .method("POST")
            .uri("/api/users/login")
            .header("content-type", "application/json")
            .header(USER_AGENT, ua)
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from(
                serde_json::json!({ "identifier": "plainuser", "password": PASSWORD }).to_string(),
            ))
            .unwrap()
    };

    let first = h.send(login("curl/8.4.0")).await;
    assert_eq!(first.status(), StatusCode::OK);
    let cookies = set_cookies(&first);
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));
    assert_eq!(json(first).await["username"], "plainuser");

    let second = h
        .send(login(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        ))
        .await;
    assert_eq!(second.status(), StatusCode::OK);

    let sessions = h.store.sessions.lock().unwrap();
    assert_eq!(sessions.len(), 1);
    let session = sessions.get(&user.id).unwrap();
    assert!(session.device_info.starts_with("Chrome"));
    assert_eq!(session.ip.as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn logout_ends_the_session_and_clears_cookies() {
    let h = Harness::new(Environment::Test);
    let user = make_user("plainuser", Role::User);
    h.add_user(&user);
    let refresh = h.open_session(&user).await;
    let stale = h.access_token(&user, Utc::now() - Duration::hours(1));

    let mut req = get(
        "/api/users/logout",
        &[("accessToken", &stale), ("refreshToken", &refresh)],
    );
    *req.method_mut() = axum::http::Method::POST;
    let resp = h.send(req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookies = set_cookies(&resp);
    assert_eq!(cookies.len(), 2, "no renewed access cookie after logout");
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=;")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=;")));
    assert!(h.store.sessions.lock().unwrap().is_empty());
    assert_eq!(json(resp).await["message"], "Logged out successfully!");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let h = Harness::new(Environment::Test);
    h.add_user(&make_user("plainuser", Role::User));
    let req = Request::builder()
        .method("POST")
        .uri("/api/users/login")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "identifier": "plainuser", "password": "Wrong1!x" }).to_string(),
        ))
        .unwrap();
    let resp = h.send(req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(resp).await["message"], "Wrong email/username or password!");
}

#[tokio::test]
async fn invalid_registration_is_a_validation_error() {
    let h = Harness::new(Environment::Test);
    let req = Request::builder()
        .method("POST")
        .uri("/api/users/register")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({
                "fullname": "Jo Doe",
                "username": "jodoe1",
                "email": "jo@example.com",
                "password": "weakpass"
            })
            .to_string(),
        ))
        .unwrap();
    let resp = h.send(req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let message = json(resp).await["message"].as_str().unwrap().to_string();
    assert!(message.contains("uppercase"), "unexpected message: {message}");
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let h = Harness::new(Environment::Test);
    let resp = h.send(get("/api/nope", &[])).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(resp).await["message"], "Not Found - /api/nope");
}
