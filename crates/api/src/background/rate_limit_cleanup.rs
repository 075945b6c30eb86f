//! Periodic sweep of expired throttle windows.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::middleware::rate_limit::RateLimiter;

/// How often expired windows are dropped.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(limiter: Arc<RateLimiter>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Rate limit cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                let before = limiter.entry_count();
                limiter.cleanup_expired();
                let after = limiter.entry_count();
                if before > after {
                    tracing::debug!(
                        removed = before - after,
                        remaining = after,
                        "Throttle windows swept"
                    );
                }
            }
        }
    }
}
