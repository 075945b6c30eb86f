//! Integration tests for error response shapes shared by every endpoint.

mod common;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use common::{access_token_for, body_json, build_test_app, get, get_auth, send};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_route_returns_json_404(pool: PgPool) {
    let response = get(build_test_app(pool), "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Route not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_api_route_is_404_even_without_token(pool: PgPool) {
    let response = get(build_test_app(pool), "/api/nothing-here").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Route not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_task_reports_entity_and_code(pool: PgPool) {
    let token = access_token_for(&pool, "jane@example.com").await;

    let response = get_auth(build_test_app(pool), "/api/tasks/999999", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["message"], "Task with id 999999 not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_bearer_scheme_is_invalid(pool: PgPool) {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/user")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = send(build_test_app(pool), request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_INVALID");
    assert_eq!(json["message"], "Token is invalid");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_json_body_is_rejected(pool: PgPool) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(build_test_app(pool), request).await;

    assert!(response.status().is_client_error());
}
