//! Login security gate decisions and audit failure reasons.
//!
//! The gate evaluates three checks in a fixed order, stopping at the first
//! block: the IP lockout track, the email lockout track, then the IP-wide
//! failure threshold over [`GLOBAL_WINDOW_MINUTES`]. The helpers below turn
//! the raw inputs of each step into an optional [`Block`]; the `api` crate
//! owns the store reads and calls them in order.

use serde::Serialize;

use crate::lockout::{self, LockoutKind};
use crate::types::Timestamp;

/// Lookback window for the IP-wide failure threshold.
pub const GLOBAL_WINDOW_MINUTES: i64 = 60;

/// Fixed retry-after returned when the IP-wide threshold blocks a login.
pub const GLOBAL_RETRY_AFTER_SECS: i64 = 3600;

/// Message returned when an IP or email lockout is active.
pub const LOCKED_MESSAGE: &str = "Account is temporarily locked due to too many failed attempts";

/// Message returned when the IP-wide threshold is exceeded.
pub const GLOBAL_THRESHOLD_MESSAGE: &str = "Too many failed attempts from this IP address";

// ---------------------------------------------------------------------------
// Failure reasons
// ---------------------------------------------------------------------------

/// Machine-checkable reason recorded with a failed login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    InvalidPassword,
    UserNotFound,
    AccountLocked,
    EmailNotVerified,
}

impl FailureReason {
    /// The value stored in `login_attempts.failure_reason`.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::InvalidPassword => "invalid_password",
            FailureReason::UserNotFound => "user_not_found",
            FailureReason::AccountLocked => "account_locked",
            FailureReason::EmailNotVerified => "email_not_verified",
        }
    }
}

// ---------------------------------------------------------------------------
// Gate decisions
// ---------------------------------------------------------------------------

/// Why a login attempt was refused before credentials were checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    IpLocked,
    EmailLocked,
    GlobalThreshold,
}

impl BlockReason {
    pub fn message(self) -> &'static str {
        match self {
            BlockReason::IpLocked | BlockReason::EmailLocked => LOCKED_MESSAGE,
            BlockReason::GlobalThreshold => GLOBAL_THRESHOLD_MESSAGE,
        }
    }
}

/// A refused login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub reason: BlockReason,
    /// Seconds until the caller may retry; always positive.
    pub retry_after: i64,
}

/// Outcome of the pre-credential login check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    Blocked(Block),
}

/// Block produced by a lockout record of the given kind, if it is locked.
pub fn lockout_block(
    kind: LockoutKind,
    locked_until: Option<Timestamp>,
    now: Timestamp,
) -> Option<Block> {
    if !lockout::is_locked(locked_until, now) {
        return None;
    }
    let reason = match kind {
        LockoutKind::Ip => BlockReason::IpLocked,
        LockoutKind::Email => BlockReason::EmailLocked,
    };
    Some(Block {
        reason,
        retry_after: lockout::remaining_seconds(locked_until, now),
    })
}

/// Block produced by the IP-wide failure count, if it reaches `threshold`.
pub fn global_threshold_block(recent_failures: i64, threshold: i64) -> Option<Block> {
    (recent_failures >= threshold).then_some(Block {
        reason: BlockReason::GlobalThreshold,
        retry_after: GLOBAL_RETRY_AFTER_SECS,
    })
}

/// Whether an email's failure counter warrants a security alert.
pub fn should_alert(email_attempts: i32, alert_threshold: i32) -> bool {
    email_attempts >= alert_threshold
}
