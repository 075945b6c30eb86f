//! Domain rules for the taskguard service.
//!
//! Everything here is pure: no database, no HTTP. The `db` and `api` crates
//! build on these types and functions.

pub mod alert;
pub mod error;
pub mod lockout;
pub mod login_security;
pub mod task;
pub mod token;
pub mod types;
