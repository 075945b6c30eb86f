//! Route definitions for account and token endpoints.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::middleware::rate_limit::{throttle_login, throttle_refresh, throttle_register};
use crate::state::AppState;

/// Public routes, each behind its own request throttle.
///
/// ```text
/// POST /register  -> register
/// POST /login     -> login
/// POST /refresh   -> refresh
/// ```
pub fn public_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/register",
            post(auth::register).route_layer(from_fn_with_state(state.clone(), throttle_register)),
        )
        .route(
            "/login",
            post(auth::login).route_layer(from_fn_with_state(state.clone(), throttle_login)),
        )
        .route(
            "/refresh",
            post(auth::refresh).route_layer(from_fn_with_state(state.clone(), throttle_refresh)),
        )
}

/// Routes that require an access token.
///
/// ```text
/// GET  /user        -> me
/// POST /logout      -> logout
/// POST /logout-all  -> logout_all
/// ```
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/user", get(auth::me))
        .route("/logout", post(auth::logout))
        .route("/logout-all", post(auth::logout_all))
}
