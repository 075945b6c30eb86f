//! Task status constants, transition rules, and the list query specification.

use serde::Deserialize;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Status constants
// ---------------------------------------------------------------------------

/// Initial status for a new task.
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";

/// All valid task statuses.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_PENDING,
    STATUS_IN_PROGRESS,
    STATUS_COMPLETED,
    STATUS_CANCELLED,
];

/// Maximum task title length (characters).
pub const MAX_TITLE_LENGTH: u64 = 255;

/// Maximum task description length (characters).
pub const MAX_DESCRIPTION_LENGTH: u64 = 1000;

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

/// Returns the set of statuses that `from_status` may transition to.
///
/// - `pending`     -> `in_progress`, `cancelled`
/// - `in_progress` -> `completed`, `cancelled`, `pending`
/// - `completed`   -> (terminal)
/// - `cancelled`   -> `pending`
pub fn valid_transitions(from_status: &str) -> &'static [&'static str] {
    match from_status {
        STATUS_PENDING => &[STATUS_IN_PROGRESS, STATUS_CANCELLED],
        STATUS_IN_PROGRESS => &[STATUS_COMPLETED, STATUS_CANCELLED, STATUS_PENDING],
        STATUS_CANCELLED => &[STATUS_PENDING],
        _ => &[],
    }
}

/// Validate that a status transition from `current` to `next` is allowed.
///
/// Re-stating the current status is not a transition and always passes.
pub fn validate_transition(current: &str, next: &str) -> Result<(), CoreError> {
    if current == next || valid_transitions(current).contains(&next) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid status transition from '{current}' to '{next}'"
        )))
    }
}

/// Validate that a status string is one of the known statuses.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid task status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        )))
    }
}

// ---------------------------------------------------------------------------
// Query specification
// ---------------------------------------------------------------------------

/// Optional filters for listing a user's tasks.
///
/// Deserialized straight from the `GET /tasks` query string. Every field is
/// optional; an empty filter lists everything the user owns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    /// Exact status match.
    pub status: Option<String>,
    /// Case-insensitive substring match on title or description.
    pub search: Option<String>,
    /// Inclusive lower bound on `deadline`.
    pub deadline_from: Option<Timestamp>,
    /// Inclusive upper bound on `deadline`.
    pub deadline_to: Option<Timestamp>,
    /// `true` keeps only tasks whose deadline has passed; `false` keeps only
    /// tasks that are not overdue (including those without a deadline).
    pub overdue: Option<bool>,
}

impl TaskFilter {
    /// Reject filters that cannot match anything meaningful.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(ref status) = self.status {
            validate_status(status)?;
        }
        if let (Some(from), Some(to)) = (self.deadline_from, self.deadline_to) {
            if from > to {
                return Err(CoreError::Validation(
                    "deadline_from must not be after deadline_to".into(),
                ));
            }
        }
        Ok(())
    }

    /// Trimmed search text, or `None` when blank.
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A task is overdue once its deadline has passed.
pub fn is_overdue(deadline: Option<Timestamp>, now: Timestamp) -> bool {
    matches!(deadline, Some(d) if d < now)
}
