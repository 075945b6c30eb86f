//! Login lockout counter model.

use sqlx::FromRow;
use taskguard_core::lockout;
use taskguard_core::types::{DbId, Timestamp};

/// A row from the `user_lockouts` table, unique on `(identifier, lockout_type)`.
#[derive(Debug, Clone, FromRow)]
pub struct UserLockout {
    pub id: DbId,
    /// Email address or client IP.
    pub identifier: String,
    /// `"email"` or `"ip"`; see [`taskguard_core::lockout::LockoutKind`].
    pub lockout_type: String,
    pub attempts: i32,
    pub locked_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserLockout {
    pub fn is_locked_at(&self, now: Timestamp) -> bool {
        lockout::is_locked(self.locked_until, now)
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked_at(chrono::Utc::now())
    }

    /// Seconds until the lock lifts; `0` when not locked.
    pub fn remaining_seconds_at(&self, now: Timestamp) -> i64 {
        lockout::remaining_seconds(self.locked_until, now)
    }

    pub fn remaining_seconds(&self) -> i64 {
        self.remaining_seconds_at(chrono::Utc::now())
    }
}
