//! Shared response envelope types for API handlers.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope, used by the task endpoints.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "message": ... }` body for endpoints that only confirm an action.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
