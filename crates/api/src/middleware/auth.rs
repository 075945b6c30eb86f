//! Bearer-token authentication for protected routes.
//!
//! [`require_session`] runs before every protected handler: it parses the
//! token, checks the session row keyed by its `jti`, records the use, and
//! attaches an [`AuthUser`] to the request. Handlers receive the identity
//! through the [`AuthUser`] extractor; nothing is read from ambient state.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use taskguard_core::token::TokenType;
use taskguard_core::types::DbId;
use taskguard_db::repositories::SessionRepo;

use crate::auth::jwt::parse_token;
use crate::error::{AppError, TokenError};
use crate::state::AppState;

/// Authenticated identity attached by [`require_session`].
///
/// Use this as an extractor parameter in any handler mounted behind the
/// middleware:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The session row backing the presented token.
    pub session_id: DbId,
    /// The presented token's `jti`.
    pub token_id: String,
    /// The sign-in the session belongs to.
    pub login_id: String,
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Token(TokenError::Missing))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(TokenError::Missing)?
        .to_str()
        .map_err(|_| TokenError::Invalid)?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .ok_or(TokenError::Invalid)?
        .trim();

    if token.is_empty() {
        return Err(TokenError::Missing);
    }
    Ok(token)
}

/// Reject the request unless it carries a valid access token whose session
/// is still active.
///
/// Failure reasons are reported distinctly: missing header, invalid token
/// (bad signature, malformed, or a refresh token), expired token, revoked
/// session.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;
    let claims = parse_token(token, &state.config.jwt)?;

    if claims.token_type != TokenType::Access {
        return Err(TokenError::Invalid.into());
    }

    let session = SessionRepo::find_by_token_id(&state.pool, &claims.jti)
        .await?
        .ok_or(TokenError::Revoked)?;

    if session.user_id != claims.sub {
        return Err(TokenError::Invalid.into());
    }
    if session.is_revoked {
        return Err(TokenError::Revoked.into());
    }
    if !session.is_active() {
        return Err(TokenError::Expired.into());
    }

    if let Err(e) = SessionRepo::touch(&state.pool, session.id).await {
        tracing::warn!(error = %e, session_id = session.id, "Failed to record session use");
    }

    request.extensions_mut().insert(AuthUser {
        user_id: session.user_id,
        session_id: session.id,
        token_id: session.token_id,
        login_id: session.login_id,
    });

    Ok(next.run(request).await)
}
