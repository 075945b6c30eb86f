//! Handlers for session management and login history.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use taskguard_core::error::CoreError;
use taskguard_core::token::TokenType;
use taskguard_core::types::{DbId, Timestamp};
use taskguard_db::models::login_attempt::LoginAttempt;
use taskguard_db::models::session::SessionSummary;
use taskguard_db::repositories::{LoginAttemptRepo, SessionRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::MessageResponse;
use crate::state::AppState;

/// Number of attempts returned by `GET /login-history`.
const LOGIN_HISTORY_LIMIT: i64 = 20;

const CURRENT_SESSION: &str = "Cannot revoke the current session. Use logout instead.";

/// Body of `GET /sessions`.
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
    pub total: usize,
}

/// One row of the login history, without request metadata.
#[derive(Debug, Serialize)]
pub struct LoginHistoryEntry {
    pub id: DbId,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub successful: bool,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
}

impl From<LoginAttempt> for LoginHistoryEntry {
    fn from(attempt: LoginAttempt) -> Self {
        Self {
            id: attempt.id,
            ip_address: attempt.ip_address,
            user_agent: attempt.user_agent,
            successful: attempt.successful,
            failure_reason: attempt.failure_reason,
            created_at: attempt.created_at,
        }
    }
}

/// Body of `GET /login-history`.
#[derive(Debug, Serialize)]
pub struct LoginHistoryResponse {
    pub attempts: Vec<LoginHistoryEntry>,
    pub total: usize,
}

/// GET /api/sessions
///
/// Active access-token sessions of the authenticated user, newest first.
pub async fn list_sessions(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<SessionListResponse>> {
    let sessions: Vec<SessionSummary> =
        SessionRepo::list_active_for_user(&state.pool, auth_user.user_id, TokenType::Access)
            .await?
            .into_iter()
            .map(|s| SessionSummary::from_session(s, auth_user.session_id))
            .collect();

    Ok(Json(SessionListResponse {
        total: sessions.len(),
        sessions,
    }))
}

/// DELETE /api/sessions/{id}
///
/// Revoke another of the user's sessions along with the refresh session of
/// the same sign-in. The current session is refused; `/logout` ends it.
pub async fn revoke_session(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let session = SessionRepo::find_for_user(&state.pool, id, auth_user.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Session",
            id,
        })?;

    // Any session of the caller's own sign-in counts as current.
    if session.login_id == auth_user.login_id {
        return Err(AppError::BadRequest(CURRENT_SESSION.into()));
    }

    let revoked = SessionRepo::revoke_login(&state.pool, &session.login_id).await?;
    tracing::info!(
        user_id = auth_user.user_id,
        session_id = session.id,
        revoked,
        "Session revoked"
    );

    Ok(Json(MessageResponse {
        message: "Session revoked successfully",
    }))
}

/// GET /api/login-history
///
/// The most recent login attempts made against the user's email.
pub async fn login_history(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<LoginHistoryResponse>> {
    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: auth_user.user_id,
        })?;

    let attempts: Vec<LoginHistoryEntry> =
        LoginAttemptRepo::history_for_email(&state.pool, &user.email, LOGIN_HISTORY_LIMIT)
            .await?
            .into_iter()
            .map(LoginHistoryEntry::from)
            .collect();

    Ok(Json(LoginHistoryResponse {
        total: attempts.len(),
        attempts,
    }))
}
