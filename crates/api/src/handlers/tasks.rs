//! Handlers for the `/tasks` resource. Every operation is scoped to the
//! authenticated user; another user's task is reported as not found.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskguard_core::error::CoreError;
use taskguard_core::task::{
    self, TaskFilter, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, STATUS_PENDING,
};
use taskguard_core::types::{DbId, Timestamp};
use taskguard_db::models::task::{CreateTask, Task, UpdateTask};
use taskguard_db::repositories::TaskRepo;

use crate::error::{AppError, AppResult, FieldErrors};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /tasks`.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `pending`.
    pub status: Option<String>,
    pub deadline: Option<Timestamp>,
}

/// Request body for `PUT /tasks/{id}`. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub deadline: Option<Timestamp>,
}

/// A task as returned by the API.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    #[serde(flatten)]
    pub task: Task,
    pub is_overdue: bool,
}

impl TaskResponse {
    fn new(task: Task, now: Timestamp) -> Self {
        Self {
            is_overdue: task::is_overdue(task.deadline, now),
            task,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/tasks
///
/// Query: `status`, `search`, `deadline_from`, `deadline_to`, `overdue`.
pub async fn list(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filter): Query<TaskFilter>,
) -> AppResult<Json<DataResponse<Vec<TaskResponse>>>> {
    filter.validate()?;

    let now = Utc::now();
    let tasks = TaskRepo::list_for_user(&state.pool, auth_user.user_id, &filter, now).await?;

    Ok(Json(DataResponse {
        data: tasks
            .into_iter()
            .map(|t| TaskResponse::new(t, now))
            .collect(),
    }))
}

/// POST /api/tasks
pub async fn create(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<TaskResponse>>)> {
    let now = Utc::now();
    let mut errors = FieldErrors::new();

    let title = input.title.trim().to_string();
    check_title(&title, &mut errors);
    check_description(input.description.as_deref(), &mut errors);
    let status = input.status.unwrap_or_else(|| STATUS_PENDING.to_string());
    if let Err(e) = task::validate_status(&status) {
        push(&mut errors, "status", core_message(e));
    }
    check_deadline(input.deadline, now, &mut errors);

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let task = TaskRepo::create(
        &state.pool,
        auth_user.user_id,
        &CreateTask {
            title,
            description: input.description,
            status,
            deadline: input.deadline,
        },
    )
    .await?;

    tracing::info!(user_id = auth_user.user_id, task_id = task.id, "Task created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: TaskResponse::new(task, now),
        }),
    ))
}

/// GET /api/tasks/{id}
pub async fn show(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TaskResponse>>> {
    let task = find_owned(&state, id, auth_user.user_id).await?;
    Ok(Json(DataResponse {
        data: TaskResponse::new(task, Utc::now()),
    }))
}

/// PUT /api/tasks/{id}
///
/// A status change must follow the task state machine.
pub async fn update(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTaskRequest>,
) -> AppResult<Json<DataResponse<TaskResponse>>> {
    let now = Utc::now();
    let current = find_owned(&state, id, auth_user.user_id).await?;

    let mut errors = FieldErrors::new();
    let title = input.title.map(|t| t.trim().to_string());
    if let Some(ref title) = title {
        check_title(title, &mut errors);
    }
    check_description(input.description.as_deref(), &mut errors);
    if let Some(ref status) = input.status {
        let checked = task::validate_status(status)
            .and_then(|()| task::validate_transition(&current.status, status));
        if let Err(e) = checked {
            push(&mut errors, "status", core_message(e));
        }
    }
    check_deadline(input.deadline, now, &mut errors);

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let changes = UpdateTask {
        title,
        description: input.description,
        status: input.status,
        deadline: input.deadline,
    };
    let task = TaskRepo::update(&state.pool, id, auth_user.user_id, &changes)
        .await?
        .ok_or(CoreError::NotFound { entity: "Task", id })?;

    tracing::info!(user_id = auth_user.user_id, task_id = task.id, "Task updated");

    Ok(Json(DataResponse {
        data: TaskResponse::new(task, now),
    }))
}

/// DELETE /api/tasks/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if TaskRepo::delete(&state.pool, id, auth_user.user_id).await? {
        tracing::info!(user_id = auth_user.user_id, task_id = id, "Task deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CoreError::NotFound { entity: "Task", id }.into())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_owned(state: &AppState, id: DbId, user_id: DbId) -> AppResult<Task> {
    TaskRepo::find_for_user(&state.pool, id, user_id)
        .await?
        .ok_or_else(|| CoreError::NotFound { entity: "Task", id }.into())
}

fn check_title(title: &str, errors: &mut FieldErrors) {
    if title.is_empty() {
        push(errors, "title", "The title field is required.".into());
    } else if title.chars().count() as u64 > MAX_TITLE_LENGTH {
        push(
            errors,
            "title",
            format!("The title may not be greater than {MAX_TITLE_LENGTH} characters."),
        );
    }
}

fn check_description(description: Option<&str>, errors: &mut FieldErrors) {
    if let Some(d) = description {
        if d.chars().count() as u64 > MAX_DESCRIPTION_LENGTH {
            push(
                errors,
                "description",
                format!(
                    "The description may not be greater than {MAX_DESCRIPTION_LENGTH} characters."
                ),
            );
        }
    }
}

fn check_deadline(deadline: Option<Timestamp>, now: Timestamp, errors: &mut FieldErrors) {
    if matches!(deadline, Some(d) if d <= now) {
        push(errors, "deadline", "The deadline must be a date after now.".into());
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: String) {
    errors.entry(field.to_string()).or_default().push(message);
}

fn core_message(err: CoreError) -> String {
    match err {
        CoreError::Validation(msg) => msg,
        other => other.to_string(),
    }
}
