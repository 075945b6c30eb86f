//! Issued-token kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Distinguishes short-lived access tokens from long-lived refresh tokens.
///
/// Serialized into the JWT `type` claim and stored in
/// `user_sessions.token_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
