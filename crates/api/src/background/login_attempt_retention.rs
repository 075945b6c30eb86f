//! Periodic cleanup of old login attempts.
//!
//! Deletes rows from `login_attempts` older than the configured retention
//! period, on a fixed interval using `tokio::time::interval`.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use taskguard_db::repositories::LoginAttemptRepo;
use tokio_util::sync::CancellationToken;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the retention loop, deleting attempts older than `retention_days`.
/// Runs until `cancel` is triggered.
pub async fn run(pool: PgPool, retention_days: i64, cancel: CancellationToken) {
    tracing::info!(
        retention_days,
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Login attempt retention job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Login attempt retention job stopping");
                break;
            }
            _ = interval.tick() => {
                purge(&pool, retention_days).await;
            }
        }
    }
}

/// One retention pass.
pub async fn purge(pool: &PgPool, retention_days: i64) -> Option<u64> {
    let cutoff = Utc::now() - chrono::Duration::days(retention_days);
    match LoginAttemptRepo::delete_older_than(pool, cutoff).await {
        Ok(deleted) => {
            if deleted > 0 {
                tracing::info!(deleted, "Login attempt retention: purged old rows");
            } else {
                tracing::debug!("Login attempt retention: no rows to purge");
            }
            Some(deleted)
        }
        Err(e) => {
            tracing::error!(error = %e, "Login attempt retention: cleanup failed");
            None
        }
    }
}
