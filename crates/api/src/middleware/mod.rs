//! Request middleware and extractors.
//!
//! - [`auth::require_session`] -- validates the bearer token against its session.
//! - [`auth::AuthUser`] -- the authenticated identity attached by `require_session`.
//! - [`client::ClientInfo`] -- client IP, user agent and audit metadata.
//! - [`rate_limit`] -- fixed-window throttle for the public auth endpoints.

pub mod auth;
pub mod client;
pub mod rate_limit;
