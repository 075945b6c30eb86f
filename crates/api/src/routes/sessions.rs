//! Route definitions for session management.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// ```text
/// GET    /sessions       -> list_sessions
/// DELETE /sessions/{id}  -> revoke_session
/// GET    /login-history  -> login_history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/{id}", delete(sessions::revoke_session))
        .route("/login-history", get(sessions::login_history))
}
