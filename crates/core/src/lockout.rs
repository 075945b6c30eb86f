//! Login lockout tracks and lock-window arithmetic.
//!
//! A lockout record counts failed logins for one identifier (an email address
//! or a client IP). The record is locked while `locked_until` lies in the
//! future. The functions here take `now` explicitly so callers and tests
//! agree on a single clock reading.

use std::fmt;

use crate::types::Timestamp;

/// Which identifier a lockout record is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockoutKind {
    Email,
    Ip,
}

impl LockoutKind {
    /// The value stored in the `user_lockouts.lockout_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            LockoutKind::Email => "email",
            LockoutKind::Ip => "ip",
        }
    }
}

impl fmt::Display for LockoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `true` iff `locked_until` is set and strictly in the future.
pub fn is_locked(locked_until: Option<Timestamp>, now: Timestamp) -> bool {
    matches!(locked_until, Some(until) if until > now)
}

/// Seconds left on an active lock, rounded up; `0` when not locked.
///
/// A locked record always reports at least one second so that a
/// `Retry-After` derived from it is never zero.
pub fn remaining_seconds(locked_until: Option<Timestamp>, now: Timestamp) -> i64 {
    match locked_until {
        Some(until) if until > now => {
            let millis = (until - now).num_milliseconds();
            ((millis + 999) / 1000).max(1)
        }
        _ => 0,
    }
}
