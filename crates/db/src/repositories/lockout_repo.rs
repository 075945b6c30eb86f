//! Repository for the `user_lockouts` table.
//!
//! Counter updates are single-statement upserts so that concurrent failed
//! logins for the same identifier never lose an increment.

use sqlx::PgPool;
use taskguard_core::lockout::LockoutKind;

use crate::models::lockout::UserLockout;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, identifier, lockout_type, attempts, locked_until, created_at, updated_at";

/// Provides counter operations for login lockouts.
pub struct LockoutRepo;

impl LockoutRepo {
    /// Fetch the record for `(identifier, kind)`, creating an unlocked one
    /// with zero attempts if none exists.
    pub async fn get_or_create(
        pool: &PgPool,
        identifier: &str,
        kind: LockoutKind,
    ) -> Result<UserLockout, sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_lockouts (identifier, lockout_type)
             VALUES ($1, $2)
             ON CONFLICT (identifier, lockout_type) DO NOTHING",
        )
        .bind(identifier)
        .bind(kind.as_str())
        .execute(pool)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM user_lockouts WHERE identifier = $1 AND lockout_type = $2"
        );
        sqlx::query_as::<_, UserLockout>(&query)
            .bind(identifier)
            .bind(kind.as_str())
            .fetch_one(pool)
            .await
    }

    /// Atomically add one failed attempt, locking the record for
    /// `lockout_minutes` once `attempts >= max_attempts`.
    ///
    /// Creates the record on first failure. Returns the row after the update.
    pub async fn increment_attempts(
        pool: &PgPool,
        identifier: &str,
        kind: LockoutKind,
        max_attempts: i32,
        lockout_minutes: i32,
    ) -> Result<UserLockout, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_lockouts (identifier, lockout_type, attempts, locked_until)
             VALUES ($1, $2, 1,
                     CASE WHEN 1 >= $3 THEN NOW() + make_interval(mins => $4) END)
             ON CONFLICT (identifier, lockout_type) DO UPDATE SET
                attempts = user_lockouts.attempts + 1,
                locked_until = CASE
                    WHEN user_lockouts.attempts + 1 >= $3
                        THEN NOW() + make_interval(mins => $4)
                    ELSE user_lockouts.locked_until
                END
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserLockout>(&query)
            .bind(identifier)
            .bind(kind.as_str())
            .bind(max_attempts)
            .bind(lockout_minutes)
            .fetch_one(pool)
            .await
    }

    /// Clear the counter and any active lock. Returns `true` if a record
    /// existed.
    pub async fn reset(
        pool: &PgPool,
        identifier: &str,
        kind: LockoutKind,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_lockouts SET attempts = 0, locked_until = NULL
             WHERE identifier = $1 AND lockout_type = $2",
        )
        .bind(identifier)
        .bind(kind.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
