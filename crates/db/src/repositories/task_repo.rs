//! Repository for the `tasks` table.
//!
//! Every query is scoped by `user_id`; a task owned by someone else is
//! indistinguishable from a missing one.

use sqlx::PgPool;
use taskguard_core::task::TaskFilter;
use taskguard_core::types::{DbId, Timestamp};

use crate::models::task::{CreateTask, Task, UpdateTask};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, title, description, status, deadline, created_at, updated_at";

/// Provides ownership-scoped CRUD operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task for `user_id`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateTask,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (user_id, title, description, status, deadline)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.status)
            .bind(input.deadline)
            .fetch_one(pool)
            .await
    }

    /// Find a task by ID if it belongs to `user_id`.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's tasks matching `filter`.
    ///
    /// Ordered by deadline ascending (tasks without a deadline last), then
    /// newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        filter: &TaskFilter,
        now: Timestamp,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let (where_clause, bind_values) = build_task_filter(user_id, filter, now);

        let query = format!(
            "SELECT {COLUMNS} FROM tasks {where_clause} \
             ORDER BY deadline ASC NULLS LAST, created_at DESC, id DESC"
        );

        let mut q = sqlx::query_as::<_, Task>(&query);
        for val in &bind_values {
            match val {
                BindValue::BigInt(v) => q = q.bind(*v),
                BindValue::Text(v) => q = q.bind(v.as_str()),
                BindValue::Timestamp(v) => q = q.bind(*v),
            }
        }
        q.fetch_all(pool).await
    }

    /// Apply the non-`None` fields of `input`. Returns the updated row, or
    /// `None` if the task does not exist for this user.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        input: &UpdateTask,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                deadline = COALESCE($6, deadline)
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.status)
            .bind(input.deadline)
            .fetch_optional(pool)
            .await
    }

    /// Delete a task. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built task queries.
#[derive(Debug, PartialEq)]
enum BindValue {
    BigInt(i64),
    Text(String),
    Timestamp(Timestamp),
}

/// Build a WHERE clause and bind values from a [`TaskFilter`].
///
/// The clause always starts with the ownership condition on `$1`.
fn build_task_filter(
    user_id: DbId,
    filter: &TaskFilter,
    now: Timestamp,
) -> (String, Vec<BindValue>) {
    let mut conditions: Vec<String> = vec!["user_id = $1".to_string()];
    let mut bind_idx = 2u32;
    let mut bind_values: Vec<BindValue> = vec![BindValue::BigInt(user_id)];

    if let Some(ref status) = filter.status {
        conditions.push(format!("status = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(status.clone()));
    }

    if let Some(search) = filter.search_text() {
        conditions.push(format!(
            "(title ILIKE ${bind_idx} OR description ILIKE ${bind_idx})"
        ));
        bind_idx += 1;
        bind_values.push(BindValue::Text(format!("%{}%", escape_like(search))));
    }

    if let Some(from) = filter.deadline_from {
        conditions.push(format!("deadline >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(from));
    }

    if let Some(to) = filter.deadline_to {
        conditions.push(format!("deadline <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(to));
    }

    match filter.overdue {
        Some(true) => {
            conditions.push(format!("deadline < ${bind_idx}"));
            bind_values.push(BindValue::Timestamp(now));
        }
        Some(false) => {
            conditions.push(format!("(deadline IS NULL OR deadline >= ${bind_idx})"));
            bind_values.push(BindValue::Timestamp(now));
        }
        None => {}
    }

    (format!("WHERE {}", conditions.join(" AND ")), bind_values)
}

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
