//! JWT issuance and parsing.
//!
//! Tokens are HS256-signed JWTs containing a [`Claims`] payload. Every token
//! carries a fresh `jti` which keys its row in `user_sessions`; the `type`
//! claim separates access tokens from refresh tokens. The lifetime is an
//! explicit argument to [`issue_token`], so issuing a refresh token never
//! touches the access-token default.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use taskguard_core::token::TokenType;
use taskguard_core::types::{DbId, Timestamp};
use uuid::Uuid;

use crate::error::TokenError;

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// Unique token identifier (UUID v4), the session lookup key.
    pub jti: String,
    /// Access or refresh.
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> Timestamp {
        DateTime::<Utc>::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 60).
    pub access_ttl_minutes: i64,
    /// Refresh token lifetime in minutes (default: 20160, two weeks).
    pub refresh_ttl_minutes: i64,
}

/// Default access token lifetime in minutes.
const DEFAULT_ACCESS_TTL_MINUTES: i64 = 60;
/// Default refresh token lifetime in minutes.
const DEFAULT_REFRESH_TTL_MINUTES: i64 = 20_160;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                   | Required | Default |
    /// |---------------------------|----------|---------|
    /// | `JWT_SECRET`              | **yes**  | --      |
    /// | `JWT_TTL_MINUTES`         | no       | `60`    |
    /// | `JWT_REFRESH_TTL_MINUTES` | no       | `20160` |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty, or if a TTL is not a
    /// positive integer.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_ttl_minutes: i64 = std::env::var("JWT_TTL_MINUTES")
            .unwrap_or_else(|_| DEFAULT_ACCESS_TTL_MINUTES.to_string())
            .parse()
            .expect("JWT_TTL_MINUTES must be a valid i64");

        let refresh_ttl_minutes: i64 = std::env::var("JWT_REFRESH_TTL_MINUTES")
            .unwrap_or_else(|_| DEFAULT_REFRESH_TTL_MINUTES.to_string())
            .parse()
            .expect("JWT_REFRESH_TTL_MINUTES must be a valid i64");

        assert!(access_ttl_minutes > 0, "JWT_TTL_MINUTES must be positive");
        assert!(refresh_ttl_minutes > 0, "JWT_REFRESH_TTL_MINUTES must be positive");

        Self {
            secret,
            access_ttl_minutes,
            refresh_ttl_minutes,
        }
    }

    /// Lifetime in minutes for the given token type.
    pub fn ttl_minutes(&self, token_type: TokenType) -> i64 {
        match token_type {
            TokenType::Access => self.access_ttl_minutes,
            TokenType::Refresh => self.refresh_ttl_minutes,
        }
    }
}

/// Sign a token of `token_type` for `user_id`, valid for `ttl_minutes`.
pub fn issue_token(
    user_id: DbId,
    token_type: TokenType,
    ttl_minutes: i64,
    config: &JwtConfig,
) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        jti: Uuid::new_v4().to_string(),
        token_type,
        iat: now,
        exp: now + ttl_minutes * 60,
    };

    let token = encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(IssuedToken { token, claims })
}

/// Validate the signature and expiry of `token`, returning its claims.
///
/// Expiry is checked with zero leeway: a token is rejected the second its
/// `exp` passes.
pub fn parse_token(token: &str, config: &JwtConfig) -> Result<Claims, TokenError> {
    let mut validation = Validation::default(); // HS256, validates exp
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}

/// Compute the SHA-256 hex digest of a signed token.
///
/// Only the digest is persisted with the session.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
