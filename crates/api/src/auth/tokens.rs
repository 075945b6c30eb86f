//! Issue a token and record its session in one step.

use taskguard_core::token::TokenType;
use taskguard_core::types::DbId;
use taskguard_db::models::session::CreateSession;
use taskguard_db::repositories::SessionRepo;
use uuid::Uuid;

use crate::auth::jwt::{hash_token, issue_token, IssuedToken};
use crate::error::{AppError, AppResult};
use crate::middleware::client::ClientInfo;
use crate::state::AppState;

/// Identifier shared by every session issued under one sign-in.
pub fn new_login_id() -> String {
    Uuid::new_v4().to_string()
}

/// Sign a `token_type` token for `user_id` and persist a session keyed by
/// its `jti` under `login_id`. The token is only returned once its session
/// row exists.
pub async fn issue_session(
    state: &AppState,
    user_id: DbId,
    token_type: TokenType,
    login_id: &str,
    device_name: Option<&str>,
    client: &ClientInfo,
) -> AppResult<IssuedToken> {
    let ttl_minutes = state.config.jwt.ttl_minutes(token_type);
    let issued = issue_token(user_id, token_type, ttl_minutes, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let input = CreateSession {
        user_id,
        token_id: issued.claims.jti.clone(),
        login_id: login_id.to_string(),
        token_type,
        token_hash: hash_token(&issued.token),
        device_name: device_name.map(str::to_string),
        ip_address: Some(client.ip_string()),
        user_agent: client.user_agent.clone(),
        expires_at: issued.claims.expires_at(),
    };
    let session = SessionRepo::create(&state.pool, &input).await?;

    tracing::debug!(
        user_id,
        session_id = session.id,
        token_type = %token_type,
        "Session issued"
    );

    Ok(issued)
}

/// Access and refresh tokens issued together by login and refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Issue an access session and a refresh session for `user_id`, both under
/// `login_id` so that revoking the login revokes the pair.
pub async fn issue_pair(
    state: &AppState,
    user_id: DbId,
    login_id: &str,
    device_name: Option<&str>,
    client: &ClientInfo,
) -> AppResult<TokenPair> {
    let access =
        issue_session(state, user_id, TokenType::Access, login_id, device_name, client).await?;
    let refresh =
        issue_session(state, user_id, TokenType::Refresh, login_id, device_name, client).await?;
    Ok(TokenPair { access, refresh })
}
