//! Repository for the `user_sessions` table.

use sqlx::PgPool;
use taskguard_core::token::TokenType;
use taskguard_core::types::DbId;

use crate::models::session::{CreateSession, UserSession};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, token_id, login_id, token_type, token_hash, device_name, \
                        ip_address, user_agent, is_revoked, expires_at, last_used_at, \
                        created_at, updated_at";

/// Provides CRUD operations for issued-token sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions
                (user_id, token_id, login_id, token_type, token_hash, device_name,
                 ip_address, user_agent, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(input.user_id)
            .bind(&input.token_id)
            .bind(&input.login_id)
            .bind(input.token_type.as_str())
            .bind(&input.token_hash)
            .bind(&input.device_name)
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find a session by its token identifier (the JWT `jti`), regardless of
    /// revocation or expiry. Callers decide what an inactive session means.
    pub async fn find_by_token_id(
        pool: &PgPool,
        token_id: &str,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_sessions WHERE token_id = $1");
        sqlx::query_as::<_, UserSession>(&query)
            .bind(token_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a session by ID, scoped to its owner.
    ///
    /// Returns `None` both for unknown IDs and for sessions belonging to
    /// another user.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_sessions WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, UserSession>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Record an authenticated use of the session.
    pub async fn touch(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE user_sessions SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Revoke a single session. Returns `true` if the row was updated.
    ///
    /// Revoking an already-revoked or unknown session is a no-op.
    pub async fn revoke(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true WHERE id = $1 AND is_revoked = false",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke every session issued under one sign-in, including the refresh
    /// session that could otherwise mint new tokens. Returns the count of
    /// sessions revoked.
    pub async fn revoke_login(pool: &PgPool, login_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true
             WHERE login_id = $1 AND is_revoked = false",
        )
        .bind(login_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Revoke every session (access and refresh) for a user.
    /// Returns the count of revoked sessions.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true
             WHERE user_id = $1 AND is_revoked = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// List a user's active sessions of one token type, newest first.
    pub async fn list_active_for_user(
        pool: &PgPool,
        user_id: DbId,
        token_type: TokenType,
    ) -> Result<Vec<UserSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_sessions
             WHERE user_id = $1
               AND token_type = $2
               AND is_revoked = false
               AND expires_at > NOW()
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(user_id)
            .bind(token_type.as_str())
            .fetch_all(pool)
            .await
    }
}
