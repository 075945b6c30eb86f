//! Repository for the `login_attempts` table (append-only audit log).

use sqlx::PgPool;
use taskguard_core::types::Timestamp;

use crate::models::login_attempt::{CreateLoginAttempt, LoginAttempt};

/// Column list for `login_attempts` SELECT queries.
const COLUMNS: &str = "\
    id, email, ip_address, user_agent, successful, \
    failure_reason, metadata, created_at";

/// Provides append and query operations for login attempts.
pub struct LoginAttemptRepo;

impl LoginAttemptRepo {
    /// Append one attempt, returning the stored row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateLoginAttempt,
    ) -> Result<LoginAttempt, sqlx::Error> {
        let query = format!(
            "INSERT INTO login_attempts
                (email, ip_address, user_agent, successful, failure_reason, metadata)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoginAttempt>(&query)
            .bind(&input.email)
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .bind(input.successful)
            .bind(input.failure_reason.map(|r| r.as_str()))
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
    }

    /// Count failed attempts from `ip_address` in the trailing
    /// `window_minutes`, across every email.
    pub async fn count_recent_failed_by_ip(
        pool: &PgPool,
        ip_address: &str,
        window_minutes: i64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM login_attempts
             WHERE ip_address = $1
               AND successful = false
               AND created_at >= NOW() - make_interval(mins => $2)",
        )
        .bind(ip_address)
        .bind(window_minutes as i32)
        .fetch_one(pool)
        .await
    }

    /// Most recent attempts for an email, newest first, capped at `limit`.
    pub async fn history_for_email(
        pool: &PgPool,
        email: &str,
        limit: i64,
    ) -> Result<Vec<LoginAttempt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM login_attempts
             WHERE email = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, LoginAttempt>(&query)
            .bind(email)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Delete attempts recorded before `cutoff`. Returns the count of deleted
    /// rows.
    pub async fn delete_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM login_attempts WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
