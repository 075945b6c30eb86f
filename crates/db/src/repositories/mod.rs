//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod lockout_repo;
pub mod login_attempt_repo;
pub mod session_repo;
pub mod task_repo;
pub mod user_repo;

pub use lockout_repo::LockoutRepo;
pub use login_attempt_repo::LoginAttemptRepo;
pub use session_repo::SessionRepo;
pub use task_repo::TaskRepo;
pub use user_repo::UserRepo;
