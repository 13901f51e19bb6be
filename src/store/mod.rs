//! Task storage module with pluggable backends.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, for testing)
//! - `sqlite`: SQLite database

mod memory;
mod sqlite;

pub use memory::InMemoryTaskStore;
pub use sqlite::SqliteTaskStore;

use crate::task::{Task, TaskId, TaskStatus};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Query over the task collection. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Case-insensitive substring of the title.
    pub title_contains: Option<String>,
    pub status: Option<TaskStatus>,
    /// Maximum number of tasks returned by `list_tasks`; ignored by `count_tasks`.
    pub limit: Option<usize>,
}

impl TaskFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn title_contains(title: impl Into<String>) -> Self {
        Self {
            title_contains: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// In-process evaluation, shared by backends that filter in Rust.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status() != status {
                return false;
            }
        }
        if let Some(ref needle) = self.title_contains {
            if !task.title.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Task store trait - implemented by all storage backends.
///
/// Listing order is most recently created first; ties fall back to the
/// higher id.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Create a task with status `NOT_STARTED`.
    async fn create_task(&self, title: &str, description: Option<&str>) -> Result<Task, String>;

    /// Get a single task by ID.
    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, String>;

    /// List tasks matching `filter`, most recent first.
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, String>;

    /// Count every task matching `filter`.
    async fn count_tasks(&self, filter: &TaskFilter) -> Result<usize, String>;

    /// Persist title, description and status of an existing task.
    /// Returns the stored record with a fresh `updated_at`.
    async fn update_task(&self, task: &Task) -> Result<Task, String>;

    /// Delete a task. Returns `false` if it did not exist.
    async fn delete_task(&self, id: TaskId) -> Result<bool, String>;
}

/// Task store type selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStoreType {
    Memory,
    #[default]
    Sqlite,
}

impl TaskStoreType {
    /// Parse from environment variable value.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Self::Memory,
            "sqlite" | "db" => Self::Sqlite,
            _ => Self::default(),
        }
    }
}

/// Create a task store based on type and configuration.
pub async fn create_task_store(
    store_type: TaskStoreType,
    base_dir: PathBuf,
) -> Result<Arc<dyn TaskStore>, String> {
    match store_type {
        TaskStoreType::Memory => Ok(Arc::new(InMemoryTaskStore::new())),
        TaskStoreType::Sqlite => {
            let store = SqliteTaskStore::new(base_dir).await?;
            Ok(Arc::new(store))
        }
    }
}
