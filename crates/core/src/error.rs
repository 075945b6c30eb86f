use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Too many attempts; `retry_after` is in seconds.
    #[error("Rate limited: {message} (retry after {retry_after}s)")]
    RateLimited { message: String, retry_after: i64 },

    #[error("Internal error: {0}")]
    Internal(String),
}
