//! Fixed-window request throttle for the public auth endpoints.
//!
//! Each `(client IP, path, method)` triple gets a counter that opens on its
//! first hit and lasts for the endpoint's decay window. Once the counter
//! reaches the endpoint's maximum, further requests are refused with 429
//! until the window closes. This is a coarse first line of defense in front
//! of the persistent lockout tracker, so counters are kept in memory only.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use axum::extract::{OriginalUri, Request, State};
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dashmap::DashMap;
use serde_json::json;

use crate::config::EndpointLimit;
use crate::error::TOO_MANY_ATTEMPTS;
use crate::middleware::client::resolve_client_ip;
use crate::state::AppState;

/// Message returned when a throttle window is exhausted.
pub const THROTTLE_MESSAGE: &str =
    "You have exceeded the maximum number of attempts. Please try again later.";

/// Counter identity: one per client, path and method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThrottleKey {
    pub ip: IpAddr,
    pub path: String,
    pub method: String,
}

/// Counter for one open window.
#[derive(Debug, Clone)]
struct Window {
    hits: u32,
    opened_at: Instant,
    length: Duration,
}

impl Window {
    fn expired_at(&self, now: Instant) -> bool {
        now.duration_since(self.opened_at) >= self.length
    }

    fn remaining_secs(&self, now: Instant) -> u64 {
        let left = self.length.saturating_sub(now.duration_since(self.opened_at));
        // Round up so a partially elapsed second still counts.
        let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
        secs.max(1)
    }
}

/// Outcome of an allowed hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleInfo {
    pub limit: u32,
    pub remaining: u32,
}

/// Outcome of a refused hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttled {
    pub limit: u32,
    /// Seconds until the window closes; always at least 1.
    pub retry_after: u64,
}

/// Thread-safe fixed-window counters.
#[derive(Debug, Default)]
pub struct RateLimiter {
    entries: DashMap<ThrottleKey, Window>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request against `key`, or refuse it if the window is full.
    pub fn hit(&self, key: ThrottleKey, limit: EndpointLimit) -> Result<ThrottleInfo, Throttled> {
        self.hit_at(key, limit, Instant::now())
    }

    fn hit_at(
        &self,
        key: ThrottleKey,
        limit: EndpointLimit,
        now: Instant,
    ) -> Result<ThrottleInfo, Throttled> {
        let length = Duration::from_secs(limit.window_secs());
        let mut entry = self.entries.entry(key).or_insert_with(|| Window {
            hits: 0,
            opened_at: now,
            length,
        });

        if entry.expired_at(now) {
            *entry = Window {
                hits: 0,
                opened_at: now,
                length,
            };
        }

        if entry.hits >= limit.max_attempts {
            return Err(Throttled {
                limit: limit.max_attempts,
                retry_after: entry.remaining_secs(now),
            });
        }

        entry.hits += 1;
        Ok(ThrottleInfo {
            limit: limit.max_attempts,
            remaining: limit.max_attempts.saturating_sub(entry.hits),
        })
    }

    /// Drop counters whose window has closed.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, window| !window.expired_at(now));
    }

    /// Number of tracked counters.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Render a wait time the way the 429 body reports it, e.g.
/// `"45 seconds"`, `"1 minute"`, `"2 minutes and 5 seconds"`.
pub fn human_readable_time(seconds: u64) -> String {
    if seconds < 60 {
        return plural(seconds, "second");
    }
    let minutes = plural(seconds / 60, "minute");
    match seconds % 60 {
        0 => minutes,
        rest => format!("{minutes} and {}", plural(rest, "second")),
    }
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Throttle `POST /login` by `LOGIN_MAX_ATTEMPTS` per `LOGIN_DECAY_MINUTES`.
pub async fn throttle_login(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let limit = state.config.security.login_limit();
    throttle(&state, limit, request, next).await
}

/// Throttle `POST /register` by `RATE_LIMIT_REGISTER`.
pub async fn throttle_register(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let limit = state.config.security.register_limit;
    throttle(&state, limit, request, next).await
}

/// Throttle `POST /refresh` by `RATE_LIMIT_REFRESH`.
pub async fn throttle_refresh(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let limit = state.config.security.refresh_limit;
    throttle(&state, limit, request, next).await
}

async fn throttle(
    state: &AppState,
    limit: EndpointLimit,
    request: Request,
    next: Next,
) -> Response {
    let ip = resolve_client_ip(
        request.headers(),
        request.extensions(),
        state.config.trust_proxy_headers,
    );
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let key = ThrottleKey {
        ip,
        path,
        method: request.method().to_string(),
    };

    match state.rate_limiter.hit(key, limit) {
        Ok(info) => {
            let mut response = next.run(request).await;
            set_limit_headers(response.headers_mut(), info.limit, info.remaining);
            response
        }
        Err(throttled) => {
            tracing::warn!(
                %ip,
                retry_after = throttled.retry_after,
                "Request throttled"
            );
            throttled_response(throttled)
        }
    }
}

fn throttled_response(throttled: Throttled) -> Response {
    let body = json!({
        "error": TOO_MANY_ATTEMPTS,
        "message": THROTTLE_MESSAGE,
        "code": "RATE_LIMITED",
        "retry_after": throttled.retry_after,
        "retry_after_readable": human_readable_time(throttled.retry_after),
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(RETRY_AFTER, HeaderValue::from(throttled.retry_after));
    set_limit_headers(headers, throttled.limit, 0);
    response
}

fn set_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
}
