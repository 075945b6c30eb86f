//! Login attempt audit models. Rows are immutable once written.

use serde::Serialize;
use sqlx::FromRow;
use taskguard_core::login_security::FailureReason;
use taskguard_core::types::{DbId, Timestamp};

/// A single login attempt from the `login_attempts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LoginAttempt {
    pub id: DbId,
    pub email: Option<String>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub successful: bool,
    pub failure_reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// DTO for appending a login attempt.
#[derive(Debug, Clone)]
pub struct CreateLoginAttempt {
    pub email: Option<String>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub successful: bool,
    pub failure_reason: Option<FailureReason>,
    pub metadata: Option<serde_json::Value>,
}
