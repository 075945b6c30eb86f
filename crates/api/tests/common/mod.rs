#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use taskguard_api::auth::jwt::JwtConfig;
use taskguard_api::auth::password::hash_password;
use taskguard_api::config::{SecurityConfig, ServerConfig};
use taskguard_api::router::build_app_router;
use taskguard_api::state::AppState;
use taskguard_core::lockout::LockoutKind;
use taskguard_core::types::DbId;
use taskguard_db::models::lockout::UserLockout;
use taskguard_db::models::user::{CreateUser, User};
use taskguard_db::repositories::UserRepo;

/// Password given to every user created by [`create_user`].
pub const PASSWORD: &str = "secret-password";

/// Build a test `ServerConfig` with safe defaults.
///
/// Proxy headers are trusted so tests can pick the client IP with
/// `X-Forwarded-For`.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        trust_proxy_headers: true,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hs256".to_string(),
            access_ttl_minutes: 60,
            refresh_ttl_minutes: 20_160,
        },
        security: SecurityConfig::default(),
    }
}

/// Build the full application router with the production middleware stack.
///
/// Every call gets a fresh request throttle; reuse one app (via `clone`) to
/// exercise throttling across requests.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

/// Like [`build_test_app`] with a custom configuration.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    build_test_app_from(AppState::new(pool, config))
}

/// Build the router around an existing state, so a test can keep a handle
/// on shared pieces such as the alert bus.
pub fn build_test_app_from(state: AppState) -> Router {
    let config = (*state.config).clone();
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should complete")
}

fn json_request(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    let request = json_request(Method::POST, uri)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST from a specific client IP.
pub async fn post_json_from(app: Router, uri: &str, body: Value, ip: &str) -> Response {
    let request = json_request(Method::POST, uri)
        .header("x-forwarded-for", ip)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    let request = json_request(Method::POST, uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    let request = json_request(Method::PUT, uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with [`PASSWORD`] directly into the database.
pub async fn create_user(pool: &PgPool, email: &str) -> User {
    let input = CreateUser {
        name: "Test User".to_string(),
        email: email.to_string(),
        password_hash: hash_password(PASSWORD).expect("hashing should succeed"),
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// Log in through the API and return the token response body.
pub async fn login(pool: &PgPool, email: &str) -> Value {
    let app = build_test_app(pool.clone());
    let body = serde_json::json!({ "email": email, "password": PASSWORD });
    let response = post_json(app, "/api/login", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await
}

/// Create a user, log in, and return the access token.
pub async fn access_token_for(pool: &PgPool, email: &str) -> String {
    create_user(pool, email).await;
    login(pool, email).await["access_token"]
        .as_str()
        .expect("access_token should be a string")
        .to_string()
}

/// Read a lockout record directly, without creating it.
pub async fn find_lockout(
    pool: &PgPool,
    identifier: &str,
    kind: LockoutKind,
) -> Option<UserLockout> {
    sqlx::query_as::<_, UserLockout>(
        "SELECT * FROM user_lockouts WHERE identifier = $1 AND lockout_type = $2",
    )
    .bind(identifier)
    .bind(kind.as_str())
    .fetch_optional(pool)
    .await
    .expect("lockout lookup should succeed")
}

/// Stamp a user's email as verified.
pub async fn mark_email_verified(pool: &PgPool, user_id: DbId) {
    sqlx::query("UPDATE users SET email_verified_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("verification update should succeed");
}
