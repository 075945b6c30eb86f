//! Security alert payload raised when an email keeps failing to log in.

use serde::Serialize;

use crate::types::Timestamp;

/// Repeated login failures against one email address.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityAlert {
    /// The email address under attack.
    pub email: String,
    /// Failed attempts counted on the email lockout track.
    pub attempts: i32,
    /// Source IP of the attempt that crossed the threshold.
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub raised_at: Timestamp,
}
