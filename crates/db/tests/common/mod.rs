#![allow(dead_code)]

//! Shared fixtures for repository integration tests.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use taskguard_core::lockout::LockoutKind;
use taskguard_core::token::TokenType;
use taskguard_db::models::lockout::UserLockout;
use taskguard_db::models::session::{CreateSession, UserSession};
use taskguard_db::models::user::{CreateUser, User};
use taskguard_db::repositories::{SessionRepo, UserRepo};

pub async fn create_user(pool: &PgPool, email: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
        },
    )
    .await
    .expect("user insert should succeed")
}

pub fn new_session(user_id: i64, token_id: &str, token_type: TokenType) -> CreateSession {
    CreateSession {
        user_id,
        token_id: token_id.to_string(),
        login_id: format!("login-{token_id}"),
        token_type,
        token_hash: format!("hash-{token_id}"),
        device_name: Some("laptop".to_string()),
        ip_address: Some("10.0.0.1".to_string()),
        user_agent: Some("test-agent".to_string()),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

pub async fn create_session(
    pool: &PgPool,
    user_id: i64,
    token_id: &str,
    token_type: TokenType,
) -> UserSession {
    SessionRepo::create(pool, &new_session(user_id, token_id, token_type))
        .await
        .expect("session insert should succeed")
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
