//! Issued-token session model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use taskguard_core::token::TokenType;
use taskguard_core::types::{DbId, Timestamp};

/// A row from the `user_sessions` table: one issued token.
///
/// `token_id` is the JWT `jti` claim and is globally unique. `token_hash` is
/// the SHA-256 digest of the signed token; the token text itself is never
/// stored. `login_id` ties together the access and refresh sessions that
/// descend from one sign-in.
#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub id: DbId,
    pub user_id: DbId,
    pub token_id: String,
    pub login_id: String,
    pub token_type: String,
    pub token_hash: String,
    pub device_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub is_revoked: bool,
    pub expires_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserSession {
    /// A session is active iff it is not revoked and has not expired.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        !self.is_revoked && self.expires_at > now
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(chrono::Utc::now())
    }

    pub fn is_token_type(&self, token_type: TokenType) -> bool {
        self.token_type == token_type.as_str()
    }
}

/// Session as shown on the session-listing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: DbId,
    pub device_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Last authenticated use, falling back to issuance time.
    pub last_used: Timestamp,
    pub expires_at: Timestamp,
    pub is_current: bool,
}

impl SessionSummary {
    pub fn from_session(session: UserSession, current_session_id: DbId) -> Self {
        Self {
            is_current: session.id == current_session_id,
            last_used: session.last_used_at.unwrap_or(session.created_at),
            id: session.id,
            device_name: session.device_name,
            ip_address: session.ip_address,
            user_agent: session.user_agent,
            expires_at: session.expires_at,
        }
    }
}

/// DTO for recording a newly issued token.
#[derive(Debug)]
pub struct CreateSession {
    pub user_id: DbId,
    pub token_id: String,
    pub login_id: String,
    pub token_type: TokenType,
    pub token_hash: String,
    pub device_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: Timestamp,
}
