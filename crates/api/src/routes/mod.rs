pub mod auth;
pub mod health;
pub mod sessions;
pub mod tasks;

use axum::middleware::from_fn_with_state;
use axum::Router;

use crate::middleware::auth::require_session;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /register                    register (public, throttled)
/// /login                       login (public, throttled)
/// /refresh                     rotate refresh token (public, throttled)
///
/// /user                        current user (auth required)
/// /logout                      revoke current session
/// /logout-all                  revoke every session
///
/// /sessions                    list active sessions
/// /sessions/{id}               revoke one other session (DELETE)
/// /login-history               recent login attempts
///
/// /tasks                       list, create
/// /tasks/{id}                  get, update, delete
/// ```
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(auth::protected_router())
        .merge(sessions::router())
        .nest("/tasks", tasks::router())
        .route_layer(from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(auth::public_router(state))
        .merge(protected)
}
