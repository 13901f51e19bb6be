//! In-memory task store (non-persistent).

use super::{TaskFilter, TaskStore};
use crate::task::task::validate_title;
use crate::task::{Task, TaskId, TaskStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    tasks: HashMap<TaskId, Task>,
    next_id: i64,
}

#[derive(Clone)]
pub struct InMemoryTaskStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                tasks: HashMap::new(),
                next_id: 1,
            })),
        }
    }

    fn sorted_matches(tasks: &HashMap<TaskId, Task>, filter: &TaskFilter) -> Vec<Task> {
        let mut matches: Vec<Task> = tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        matches
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn create_task(&self, title: &str, description: Option<&str>) -> Result<Task, String> {
        validate_title(title).map_err(|e| e.to_string())?;
        let mut inner = self.inner.write().await;
        let id = TaskId::new(inner.next_id);
        inner.next_id += 1;
        let now = Utc::now();
        let task = Task::new(
            id,
            title.to_string(),
            description.map(|s| s.to_string()),
            TaskStatus::NotStarted,
            now,
            now,
        )
        .map_err(|e| e.to_string())?;
        inner.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, String> {
        Ok(self.inner.read().await.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, String> {
        let inner = self.inner.read().await;
        let mut tasks = Self::sorted_matches(&inner.tasks, filter);
        if let Some(limit) = filter.limit {
            tasks.truncate(limit);
        }
        Ok(tasks)
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> Result<usize, String> {
        let inner = self.inner.read().await;
        Ok(inner.tasks.values().filter(|t| filter.matches(t)).count())
    }

    async fn update_task(&self, task: &Task) -> Result<Task, String> {
        validate_title(&task.title).map_err(|e| e.to_string())?;
        let mut inner = self.inner.write().await;
        let stored = inner
            .tasks
            .get_mut(&task.id)
            .ok_or_else(|| format!("Task {} not found", task.id))?;
        let mut updated = task.clone();
        updated.created_at = stored.created_at;
        updated.updated_at = Utc::now();
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete_task(&self, id: TaskId) -> Result<bool, String> {
        Ok(self.inner.write().await.tasks.remove(&id).is_some())
    }
}
