//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- JWT issuance and parsing for access and refresh tokens.
//! - [`login_security`] -- the pre-credential login gate and attempt recording.
//! - [`tokens`] -- issuing a token and recording its session in one step.

pub mod jwt;
pub mod login_security;
pub mod password;
pub mod tokens;
