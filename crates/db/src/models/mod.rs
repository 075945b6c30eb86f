//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A create DTO for inserts
//! - An update DTO (all `Option` fields) where the entity is mutable

pub mod lockout;
pub mod login_attempt;
pub mod session;
pub mod task;
pub mod user;
