//! Core Task type and its lifecycle status.
//!
//! # Invariants
//! - `title` is never empty once a task exists
//! - `status` only changes through [`Task::set_status`], which applies the
//!   transition guard
//! - `id` is assigned by the store and unique within it

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::transition;

/// Store-assigned identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(TaskId)
    }
}

/// Status of a task in its lifecycle.
///
/// # State Machine
/// ```text
/// NotStarted -> InProgress -> Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Wire/database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "NOT_STARTED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    /// Check if the task can no longer move.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskError;

    /// Accepts `IN_PROGRESS`, `in_progress`, `in progress` and `in-progress`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();
        match normalized.as_str() {
            "NOT_STARTED" => Ok(TaskStatus::NotStarted),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "COMPLETED" => Ok(TaskStatus::Completed),
            _ => Err(TaskError::UnknownStatus(s.to_string())),
        }
    }
}

/// A tracked task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Build a task record as a store would hand it out.
    ///
    /// # Errors
    /// Returns `TaskError::EmptyTitle` if `title` is blank.
    pub fn new(
        id: TaskId,
        title: String,
        description: Option<String>,
        status: TaskStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, TaskError> {
        validate_title(&title)?;
        Ok(Self {
            id,
            title,
            description,
            status,
            created_at,
            updated_at,
        })
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Move the task to `requested`, enforcing the lifecycle.
    ///
    /// Requesting the current status is a no-op. Returns `true` if the
    /// status actually changed.
    pub fn set_status(&mut self, requested: TaskStatus) -> Result<bool, TaskError> {
        let next = transition::transition(self.status, requested)?;
        let changed = next != self.status;
        self.status = next;
        Ok(changed)
    }

    /// Replace the title, rejecting blank values.
    pub fn rename(&mut self, title: String) -> Result<(), TaskError> {
        validate_title(&title)?;
        self.title = title;
        Ok(())
    }
}

pub(crate) fn validate_title(title: &str) -> Result<(), TaskError> {
    if title.trim().is_empty() {
        return Err(TaskError::EmptyTitle);
    }
    Ok(())
}

/// Errors that can occur during task operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("Task title cannot be empty")]
    EmptyTitle,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("Invalid status '{0}'. Expected one of NOT_STARTED, IN_PROGRESS, COMPLETED.")]
    UnknownStatus(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: TaskStatus) -> Task {
        let now = Utc::now();
        Task::new(TaskId::new(1), "Write report".into(), None, status, now, now).unwrap()
    }

    #[test]
    fn test_status_parsing_is_lenient() {
        assert_eq!("IN_PROGRESS".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("in progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("not-started".parse::<TaskStatus>().unwrap(), TaskStatus::NotStarted);
        assert_eq!(" completed ".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
        assert_eq!(
            "DONE".parse::<TaskStatus>(),
            Err(TaskError::UnknownStatus("DONE".into()))
        );
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&TaskStatus::NotStarted).unwrap();
        assert_eq!(json, "\"NOT_STARTED\"");
        let status: TaskStatus = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(status, TaskStatus::Completed);
    }

    #[test]
    fn test_empty_title_rejected() {
        let now = Utc::now();
        let result = Task::new(TaskId::new(1), "   ".into(), None, TaskStatus::NotStarted, now, now);
        assert_eq!(result, Err(TaskError::EmptyTitle));
    }

    #[test]
    fn test_set_status_walks_forward() {
        let mut t = task(TaskStatus::NotStarted);
        assert!(t.set_status(TaskStatus::InProgress).unwrap());
        assert!(t.set_status(TaskStatus::Completed).unwrap());
        assert_eq!(t.status(), TaskStatus::Completed);
    }

    #[test]
    fn test_set_status_same_is_noop() {
        let mut t = task(TaskStatus::InProgress);
        assert!(!t.set_status(TaskStatus::InProgress).unwrap());
        assert_eq!(t.status(), TaskStatus::InProgress);
    }

    #[test]
    fn test_set_status_rejects_skip() {
        let mut t = task(TaskStatus::NotStarted);
        let err = t.set_status(TaskStatus::Completed).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition from NOT_STARTED to COMPLETED"
        );
        assert_eq!(t.status(), TaskStatus::NotStarted);
    }

    #[test]
    fn test_task_id_parsing() {
        assert_eq!("42".parse::<TaskId>().unwrap(), TaskId::new(42));
        assert!("forty".parse::<TaskId>().is_err());
    }
}
