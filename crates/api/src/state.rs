use std::sync::Arc;

use crate::config::ServerConfig;
use crate::middleware::rate_limit::RateLimiter;
use crate::notifications::AlertBus;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
/// Session, lockout and audit state live only in the database; the request
/// throttle is the one in-process counter.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: taskguard_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Fixed-window request throttle for the public auth endpoints.
    pub rate_limiter: Arc<RateLimiter>,
    /// Security alerts raised by the login gate.
    pub alerts: AlertBus,
}

impl AppState {
    pub fn new(pool: taskguard_db::DbPool, config: ServerConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            rate_limiter: Arc::new(RateLimiter::new()),
            alerts: AlertBus::new(),
        }
    }
}
