//! Handlers for account and token endpoints (register, login, refresh,
//! logout, current user).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use taskguard_core::error::CoreError;
use taskguard_core::login_security::{FailureReason, GateDecision};
use taskguard_core::token::TokenType;
use taskguard_core::types::DbId;
use taskguard_db::models::user::{CreateUser, UserResponse};
use taskguard_db::repositories::{SessionRepo, UserRepo};
use validator::Validate;

use crate::auth::jwt::parse_token;
use crate::auth::login_security::LoginSecurity;
use crate::auth::password::{hash_password, verify_password_or_dummy};
use crate::auth::tokens::{issue_pair, issue_session, new_login_id, TokenPair};
use crate::error::{AppError, AppResult, TokenError};
use crate::middleware::auth::AuthUser;
use crate::middleware::client::ClientInfo;
use crate::response::MessageResponse;
use crate::state::AppState;

/// The `token_type` reported alongside every issued token.
const BEARER: &str = "bearer";

/// Returned for both unknown emails and wrong passwords.
const INVALID_CREDENTIALS: &str = "Incorrect email or password!";

const EMAIL_TAKEN: &str = "The email has already been taken.";

const EMAIL_NOT_VERIFIED: &str = "Your email address is not verified.";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "The name field is required and may not be greater than 255 characters."
    ))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "The password must be at least 6 characters."))]
    pub password: String,
}

/// Request body for `POST /login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
    #[validate(length(
        max = 255,
        message = "The device name may not be greater than 255 characters."
    ))]
    pub device_name: Option<String>,
}

/// Request body for `POST /refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Public user info embedded in the register response.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub name: String,
    pub email: String,
}

/// Body of a successful `POST /register`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RegisterResponse {
    /// Token issued straight away.
    Issued {
        access_token: String,
        token_type: &'static str,
        user: UserInfo,
    },
    /// Account created, but login waits for email verification.
    PendingVerification { message: &'static str, user: UserInfo },
}

/// Token pair returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub user_id: DbId,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

impl TokenResponse {
    fn new(pair: TokenPair, user_id: DbId, state: &AppState) -> Self {
        Self {
            access_token: pair.access.token,
            refresh_token: pair.refresh.token,
            token_type: BEARER,
            user_id,
            expires_in: state.config.jwt.access_ttl_minutes * 60,
        }
    }
}

/// Body of `POST /logout-all`.
#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    pub message: &'static str,
    pub revoked_count: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/register
///
/// Create an account. Unless email verification is required, an access
/// token is issued and its session recorded.
pub async fn register(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(mut input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    input.name = input.name.trim().to_string();
    input.email = normalize_email(&input.email);
    input.validate()?;

    if UserRepo::exists_by_email(&state.pool, &input.email).await? {
        return Err(AppError::field("email", EMAIL_TAKEN));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            name: input.name,
            email: input.email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User registered");

    let info = UserInfo {
        id: user.id,
        name: user.name,
        email: user.email,
    };

    if state.config.security.email_verification_required {
        return Ok((
            StatusCode::CREATED,
            Json(RegisterResponse::PendingVerification {
                message: "Registration successful. Please verify your email address.",
                user: info,
            }),
        ));
    }

    let login_id = new_login_id();
    let access =
        issue_session(&state, info.id, TokenType::Access, &login_id, None, &client).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse::Issued {
            access_token: access.token,
            token_type: BEARER,
            user: info,
        }),
    ))
}

/// POST /api/login
///
/// Authenticate with email + password behind the login security gate.
/// Returns an access and refresh token, each backed by a session.
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(mut input): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    input.email = normalize_email(&input.email);
    input.validate()?;

    let gate = LoginSecurity::new(
        &state.pool,
        &state.config.security,
        &state.alerts,
        &client,
    );

    // 1. Lockouts and the IP-wide threshold, before touching credentials.
    if let GateDecision::Blocked(block) = gate.check_login_allowed(&input.email).await? {
        gate.log_blocked_attempt(&input.email).await;
        tracing::warn!(
            email = %input.email,
            ip = %client.ip,
            reason = ?block.reason,
            retry_after = block.retry_after,
            "Login blocked"
        );
        return Err(CoreError::RateLimited {
            message: block.reason.message().to_string(),
            retry_after: block.retry_after,
        }
        .into());
    }

    // 2. Credentials. Unknown emails still pay for a hash comparison.
    let user = UserRepo::find_by_email(&state.pool, &input.email).await?;
    let password_valid = verify_password_or_dummy(
        &input.password,
        user.as_ref().map(|u| u.password_hash.as_str()),
    )
    .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    let user = match user {
        Some(user) if password_valid => user,
        Some(_) => {
            gate.log_attempt(&input.email, Some(FailureReason::InvalidPassword))
                .await;
            return Err(CoreError::Unauthorized(INVALID_CREDENTIALS.into()).into());
        }
        None => {
            gate.log_attempt(&input.email, Some(FailureReason::UserNotFound))
                .await;
            return Err(CoreError::Unauthorized(INVALID_CREDENTIALS.into()).into());
        }
    };

    // 3. Verification policy.
    if state.config.security.email_verification_required && !user.is_email_verified() {
        gate.log_attempt(&input.email, Some(FailureReason::EmailNotVerified))
            .await;
        return Err(CoreError::Forbidden(EMAIL_NOT_VERIFIED.into()).into());
    }

    // 4. Success: reset counters, then issue tokens.
    gate.log_attempt(&input.email, None).await;

    let login_id = new_login_id();
    let pair = issue_pair(
        &state,
        user.id,
        &login_id,
        input.device_name.as_deref(),
        &client,
    )
    .await?;
    tracing::info!(user_id = user.id, ip = %client.ip, "User logged in");

    Ok(Json(TokenResponse::new(pair, user.id, &state)))
}

/// POST /api/refresh
///
/// Exchange a refresh token for a new access + refresh pair. The presented
/// refresh session is revoked, so each refresh token works once. The new pair
/// stays under the same login, so logging out of it also ends earlier tokens
/// from that sign-in.
pub async fn refresh(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let claims = parse_token(input.refresh_token.trim(), &state.config.jwt)?;
    if claims.token_type != TokenType::Refresh {
        return Err(TokenError::Invalid.into());
    }

    let session = SessionRepo::find_by_token_id(&state.pool, &claims.jti)
        .await?
        .ok_or(TokenError::Revoked)?;

    if session.user_id != claims.sub || !session.is_token_type(TokenType::Refresh) {
        return Err(TokenError::Invalid.into());
    }
    if session.is_revoked {
        return Err(TokenError::Revoked.into());
    }
    if !session.is_active() {
        return Err(TokenError::Expired.into());
    }

    // Rotation: losing the revoke race means another request already used it.
    if !SessionRepo::revoke(&state.pool, session.id).await? {
        return Err(TokenError::Revoked.into());
    }

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| CoreError::Unauthorized("User no longer exists".into()))?;

    let pair = issue_pair(
        &state,
        user.id,
        &session.login_id,
        session.device_name.as_deref(),
        &client,
    )
    .await?;
    tracing::info!(user_id = user.id, old_session_id = session.id, "Tokens refreshed");

    Ok(Json(TokenResponse::new(pair, user.id, &state)))
}

/// POST /api/logout
///
/// Revoke the session behind the presented access token together with the
/// refresh session issued alongside it.
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<MessageResponse>> {
    let revoked = SessionRepo::revoke_login(&state.pool, &auth_user.login_id).await?;
    tracing::info!(
        user_id = auth_user.user_id,
        session_id = auth_user.session_id,
        revoked,
        token_id = %auth_user.token_id,
        "User logged out"
    );
    Ok(Json(MessageResponse {
        message: "Successfully logged out",
    }))
}

/// POST /api/logout-all
///
/// Revoke every access and refresh session of the authenticated user.
pub async fn logout_all(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<LogoutAllResponse>> {
    let revoked_count = SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    tracing::info!(user_id = auth_user.user_id, revoked_count, "User logged out everywhere");
    Ok(Json(LogoutAllResponse {
        message: "Successfully logged out from all devices",
        revoked_count,
    }))
}

/// GET /api/user
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<UserResponse>> {
    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: auth_user.user_id,
        })?;
    Ok(Json(user.into()))
}

/// Emails are matched case-insensitively by storing them lowercased.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
