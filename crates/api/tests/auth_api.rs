//! HTTP-level integration tests for registration, login, token refresh,
//! logout and the token middleware.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, build_test_app_with, create_user, get, get_auth, login, post_auth,
    post_json, test_config, PASSWORD,
};
use serde_json::json;
use sqlx::PgPool;
use taskguard_api::auth::jwt::{issue_token, parse_token};
use taskguard_core::token::TokenType;
use taskguard_db::repositories::{LoginAttemptRepo, SessionRepo};

fn jti_of(token: &str) -> String {
    parse_token(token, &test_config().jwt)
        .expect("token should parse")
        .jti
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_issues_access_token(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let body = json!({ "name": "Jane", "email": "Jane@Example.com", "password": "secret1" });
    let response = post_json(app, "/api/register", body).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["token_type"], "bearer");
    assert_eq!(json["user"]["name"], "Jane");
    assert_eq!(json["user"]["email"], "jane@example.com");

    let token = json["access_token"].as_str().expect("access_token");
    let session = SessionRepo::find_by_token_id(&pool, &jti_of(token))
        .await
        .unwrap()
        .expect("registration should record a session");
    assert!(session.is_active());
    assert!(session.is_token_type(TokenType::Access));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_duplicate_email_returns_422(pool: PgPool) {
    create_user(&pool, "taken@example.com").await;

    let app = build_test_app(pool);
    let body = json!({ "name": "Other", "email": "TAKEN@example.com", "password": "secret1" });
    let response = post_json(app, "/api/register", body).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["errors"]["email"][0], "The email has already been taken.");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_reports_every_invalid_field(pool: PgPool) {
    let app = build_test_app(pool);
    let body = json!({ "name": "", "email": "nope", "password": "123" });
    let response = post_json(app, "/api/register", body).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["message"], "The given data was invalid.");
    assert!(json["errors"]["name"].is_array());
    assert!(json["errors"]["email"].is_array());
    assert!(json["errors"]["password"].is_array());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn verification_mode_withholds_tokens(pool: PgPool) {
    let mut config = test_config();
    config.security.email_verification_required = true;

    let app = build_test_app_with(pool.clone(), config.clone());
    let body = json!({ "name": "Jane", "email": "jane@example.com", "password": PASSWORD });
    let response = post_json(app, "/api/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json.get("access_token").is_none());
    assert!(json["message"].is_string());

    let user_id = json["user"]["id"].as_i64().unwrap();

    let app = build_test_app_with(pool.clone(), config.clone());
    let body = json!({ "email": "jane@example.com", "password": PASSWORD });
    let response = post_json(app, "/api/login", body.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let history = LoginAttemptRepo::history_for_email(&pool, "jane@example.com", 5)
        .await
        .unwrap();
    assert_eq!(history[0].failure_reason.as_deref(), Some("email_not_verified"));

    common::mark_email_verified(&pool, user_id).await;
    let app = build_test_app_with(pool, config);
    let response = post_json(app, "/api/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_returns_token_pair_backed_by_sessions(pool: PgPool) {
    let user = create_user(&pool, "jane@example.com").await;

    let json = login(&pool, "jane@example.com").await;
    assert_eq!(json["token_type"], "bearer");
    assert_eq!(json["user_id"], user.id);
    assert_eq!(json["expires_in"], 3600);

    let access_jti = jti_of(json["access_token"].as_str().unwrap());
    let access = SessionRepo::find_by_token_id(&pool, &access_jti)
        .await
        .unwrap()
        .expect("access session");
    assert!(access.is_active());
    assert!(access.is_token_type(TokenType::Access));
    assert_eq!(access.user_id, user.id);

    let refresh_jti = jti_of(json["refresh_token"].as_str().unwrap());
    let refresh = SessionRepo::find_by_token_id(&pool, &refresh_jti)
        .await
        .unwrap()
        .expect("refresh session");
    assert!(refresh.is_token_type(TokenType::Refresh));

    let history = LoginAttemptRepo::history_for_email(&pool, "jane@example.com", 5)
        .await
        .unwrap();
    assert!(history[0].successful);
    assert!(history[0].metadata.as_ref().unwrap()["request_id"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_matches_email_case_insensitively(pool: PgPool) {
    create_user(&pool, "jane@example.com").await;

    let app = build_test_app(pool);
    let body = json!({ "email": " JANE@example.com ", "password": PASSWORD });
    let response = post_json(app, "/api/login", body).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_password_returns_401_and_is_audited(pool: PgPool) {
    create_user(&pool, "jane@example.com").await;

    let app = build_test_app(pool.clone());
    let body = json!({ "email": "jane@example.com", "password": "wrong-password" });
    let response = post_json(app, "/api/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Incorrect email or password!");

    let history = LoginAttemptRepo::history_for_email(&pool, "jane@example.com", 5)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert!(!history[0].successful);
    assert_eq!(history[0].failure_reason.as_deref(), Some("invalid_password"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_email_returns_same_401(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let body = json!({ "email": "ghost@example.com", "password": "whatever" });
    let response = post_json(app, "/api/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Incorrect email or password!");

    let history = LoginAttemptRepo::history_for_email(&pool, "ghost@example.com", 5)
        .await
        .unwrap();
    assert_eq!(history[0].failure_reason.as_deref(), Some("user_not_found"));
}

// ---------------------------------------------------------------------------
// Token middleware
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn current_user_requires_token(pool: PgPool) {
    let response = get(build_test_app(pool.clone()), "/api/user").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_MISSING");
    assert_eq!(json["message"], "Authorization header not found");

    let response = get_auth(build_test_app(pool), "/api/user", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "TOKEN_INVALID");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn current_user_returns_profile(pool: PgPool) {
    let token = common::access_token_for(&pool, "jane@example.com").await;

    let response = get_auth(build_test_app(pool.clone()), "/api/user", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["email"], "jane@example.com");
    assert!(json.get("password_hash").is_none());

    let session = SessionRepo::find_by_token_id(&pool, &jti_of(&token))
        .await
        .unwrap()
        .unwrap();
    assert!(session.last_used_at.is_some(), "middleware should touch the session");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_token_is_rejected(pool: PgPool) {
    let user = create_user(&pool, "jane@example.com").await;
    let expired = issue_token(user.id, TokenType::Access, -1, &test_config().jwt).unwrap();

    let response = get_auth(build_test_app(pool), "/api/user", &expired.token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_EXPIRED");
    assert_eq!(json["message"], "Token has expired");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn token_without_session_is_rejected(pool: PgPool) {
    let user = create_user(&pool, "jane@example.com").await;
    let orphan = issue_token(user.id, TokenType::Access, 60, &test_config().jwt).unwrap();

    let response = get_auth(build_test_app(pool), "/api/user", &orphan.token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "TOKEN_REVOKED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_token_cannot_reach_protected_routes(pool: PgPool) {
    create_user(&pool, "jane@example.com").await;
    let json = login(&pool, "jane@example.com").await;
    let refresh = json["refresh_token"].as_str().unwrap();

    let response = get_auth(build_test_app(pool), "/api/user", refresh).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "TOKEN_INVALID");
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_revokes_the_presented_token(pool: PgPool) {
    let token = common::access_token_for(&pool, "jane@example.com").await;

    let response = post_auth(build_test_app(pool.clone()), "/api/logout", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Successfully logged out");

    let session = SessionRepo::find_by_token_id(&pool, &jti_of(&token))
        .await
        .unwrap()
        .unwrap();
    assert!(session.is_revoked);

    let response = get_auth(build_test_app(pool), "/api/user", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_REVOKED");
    assert_eq!(json["message"], "Token has been revoked");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_also_revokes_the_paired_refresh_token(pool: PgPool) {
    create_user(&pool, "jane@example.com").await;
    let json = login(&pool, "jane@example.com").await;
    let access = json["access_token"].as_str().unwrap();

    let response = post_auth(build_test_app(pool.clone()), "/api/logout", access).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json!({ "refresh_token": json["refresh_token"] });
    let response = post_json(build_test_app(pool.clone()), "/api/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "TOKEN_REVOKED");

    let refresh_jti = jti_of(json["refresh_token"].as_str().unwrap());
    let refresh = SessionRepo::find_by_token_id(&pool, &refresh_jti)
        .await
        .unwrap()
        .unwrap();
    assert!(refresh.is_revoked);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_leaves_other_logins_alone(pool: PgPool) {
    create_user(&pool, "jane@example.com").await;
    let laptop = login(&pool, "jane@example.com").await;
    let phone = login(&pool, "jane@example.com").await;

    let access = laptop["access_token"].as_str().unwrap();
    let response = post_auth(build_test_app(pool.clone()), "/api/logout", access).await;
    assert_eq!(response.status(), StatusCode::OK);

    let phone_access = phone["access_token"].as_str().unwrap();
    let response = get_auth(build_test_app(pool.clone()), "/api/user", phone_access).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json!({ "refresh_token": phone["refresh_token"] });
    let response = post_json(build_test_app(pool), "/api/refresh", body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_without_token_returns_401(pool: PgPool) {
    let response = post_json(build_test_app(pool), "/api/logout", json!({})).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_all_revokes_every_session(pool: PgPool) {
    create_user(&pool, "jane@example.com").await;
    let first = login(&pool, "jane@example.com").await;
    let second = login(&pool, "jane@example.com").await;
    let first_access = first["access_token"].as_str().unwrap();
    let second_access = second["access_token"].as_str().unwrap();

    let response = post_auth(build_test_app(pool.clone()), "/api/logout-all", first_access).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    // Two logins, each with an access and a refresh session.
    assert_eq!(json["revoked_count"], 4);

    let response = get_auth(build_test_app(pool.clone()), "/api/user", second_access).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json!({ "refresh_token": second["refresh_token"] });
    let response = post_json(build_test_app(pool), "/api/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rotates_the_token_pair(pool: PgPool) {
    create_user(&pool, "jane@example.com").await;
    let json = login(&pool, "jane@example.com").await;
    let old_refresh = json["refresh_token"].as_str().unwrap().to_string();

    let body = json!({ "refresh_token": old_refresh });
    let response = post_json(build_test_app(pool.clone()), "/api/refresh", body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    assert_ne!(rotated["refresh_token"], old_refresh.as_str());

    let response = get_auth(
        build_test_app(pool.clone()),
        "/api/user",
        rotated["access_token"].as_str().unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The old refresh token was consumed.
    let response = post_json(build_test_app(pool), "/api/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "TOKEN_REVOKED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_after_refresh_ends_the_whole_login(pool: PgPool) {
    create_user(&pool, "jane@example.com").await;
    let original = login(&pool, "jane@example.com").await;

    let body = json!({ "refresh_token": original["refresh_token"] });
    let response = post_json(build_test_app(pool.clone()), "/api/refresh", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;

    let access = rotated["access_token"].as_str().unwrap();
    let response = post_auth(build_test_app(pool.clone()), "/api/logout", access).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json!({ "refresh_token": rotated["refresh_token"] });
    let response = post_json(build_test_app(pool.clone()), "/api/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let original_access = original["access_token"].as_str().unwrap();
    let response = get_auth(build_test_app(pool), "/api/user", original_access).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn access_token_cannot_refresh(pool: PgPool) {
    let token = common::access_token_for(&pool, "jane@example.com").await;

    let body = json!({ "refresh_token": token });
    let response = post_json(build_test_app(pool), "/api/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "TOKEN_INVALID");
}
