//! Task entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use taskguard_core::types::{DbId, Timestamp};

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub deadline: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a task. Inputs are validated by the API layer.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub deadline: Option<Timestamp>,
}

/// DTO for updating a task. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub deadline: Option<Timestamp>,
}
