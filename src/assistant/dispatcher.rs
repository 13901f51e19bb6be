//! Executes interpreted intents against the task store.
//!
//! Intents run one after another; each produces an [`Outcome`] and a failure
//! never stops the ones after it. A single processed intent is reported as a
//! bare outcome, anything else as an [`AggregatedResponse`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::intent::{Intent, TaskRef, CREATE_TASK, DELETE_TASK, LIST_TASKS, UPDATE_TASK_STATUS};
use super::resolver::resolve;
use crate::store::{TaskFilter, TaskStore};
use crate::task::{Task, TaskId, TaskStatus};

/// Maximum number of tasks echoed back by `list_tasks`.
pub const LIST_PREVIEW_LIMIT: usize = 5;

const INVALID_FORMAT: &str = "Invalid intent format received.";

/// Compact view of a task included in outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            status: task.status(),
        }
    }
}

/// Result of executing one intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub action: String,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl Outcome {
    fn ok(action: &str, message: String) -> Self {
        Self {
            action: action.to_string(),
            success: true,
            message,
            task: None,
            tasks: None,
            count: None,
        }
    }

    fn failed(action: &str, message: impl Into<String>) -> Self {
        Self {
            action: action.to_string(),
            success: false,
            message: message.into(),
            task: None,
            tasks: None,
            count: None,
        }
    }

    fn with_task(mut self, task: &Task) -> Self {
        self.task = Some(TaskSummary::from(task));
        self
    }
}

/// Summary over a batch of outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedResponse {
    /// True when at least one intent succeeded.
    pub success: bool,
    pub message: String,
    pub results: Vec<Outcome>,
    pub total: usize,
    pub succeeded: usize,
}

impl AggregatedResponse {
    fn from_outcomes(results: Vec<Outcome>) -> Self {
        let total = results.len();
        let succeeded = results.iter().filter(|o| o.success).count();
        Self {
            success: succeeded > 0,
            message: format!("Processed {} actions. {} succeeded.", total, succeeded),
            results,
            total,
            succeeded,
        }
    }
}

/// The input was not an intent or a list of intents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DispatchResult {
    Single(Outcome),
    Batch(AggregatedResponse),
    Rejected(Rejection),
}

impl DispatchResult {
    pub fn success(&self) -> bool {
        match self {
            DispatchResult::Single(outcome) => outcome.success,
            DispatchResult::Batch(batch) => batch.success,
            DispatchResult::Rejected(rejection) => rejection.success,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            DispatchResult::Single(outcome) => &outcome.message,
            DispatchResult::Batch(batch) => &batch.message,
            DispatchResult::Rejected(rejection) => &rejection.message,
        }
    }
}

/// Routes intents to task operations.
pub struct IntentDispatcher {
    store: Arc<dyn TaskStore>,
}

impl IntentDispatcher {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Dispatch raw JSON: one intent object or an array of them.
    ///
    /// Array entries that are not objects are skipped.
    pub async fn dispatch_value(&self, value: &Value) -> DispatchResult {
        let intents: Vec<Intent> = match value {
            Value::Object(_) => Intent::from_value(value).into_iter().collect(),
            Value::Array(items) => items.iter().filter_map(Intent::from_value).collect(),
            _ => {
                tracing::warn!("Rejected intent payload that is neither object nor array");
                return DispatchResult::Rejected(Rejection {
                    success: false,
                    message: INVALID_FORMAT.to_string(),
                });
            }
        };
        self.dispatch(&intents).await
    }

    /// Run every intent in order and aggregate the outcomes.
    pub async fn dispatch(&self, intents: &[Intent]) -> DispatchResult {
        let mut results = Vec::with_capacity(intents.len());
        for intent in intents {
            let outcome = self.execute(intent).await;
            tracing::debug!(
                "Intent {} finished: success={} message={}",
                outcome.action,
                outcome.success,
                outcome.message
            );
            results.push(outcome);
        }

        if results.len() == 1 {
            if let Some(outcome) = results.pop() {
                return DispatchResult::Single(outcome);
            }
        }

        let batch = AggregatedResponse::from_outcomes(results);
        tracing::info!("{}", batch.message);
        DispatchResult::Batch(batch)
    }

    async fn execute(&self, intent: &Intent) -> Outcome {
        let action = intent.action();
        let result = match intent {
            Intent::CreateTask { title, description } => {
                self.create_task(title.as_deref(), description.as_deref()).await
            }
            Intent::UpdateTaskStatus { target, status } => {
                self.update_task_status(target, status.as_deref()).await
            }
            Intent::DeleteTask { target } => self.delete_task(target).await,
            Intent::ListTasks { status } => self.list_tasks(status.as_deref()).await,
            Intent::Unknown { .. } | Intent::Error { .. } | Intent::Unsupported { .. } => {
                Ok(Outcome::failed(action, "Unknown action."))
            }
        };

        result.unwrap_or_else(|e| {
            tracing::warn!("Store error while handling {}: {}", action, e);
            Outcome::failed(action, e)
        })
    }

    async fn create_task(
        &self,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Outcome, String> {
        let title = match title {
            Some(title) if !title.trim().is_empty() => title.trim(),
            _ => {
                return Ok(Outcome::failed(
                    CREATE_TASK,
                    "Title is required for creating a task.",
                ))
            }
        };

        let task = self.store.create_task(title, description).await?;
        tracing::info!("Created task {} ({})", task.id, task.title);
        Ok(Outcome::ok(
            CREATE_TASK,
            format!("Task '{}' created successfully.", task.title),
        )
        .with_task(&task))
    }

    async fn update_task_status(
        &self,
        target: &TaskRef,
        status: Option<&str>,
    ) -> Result<Outcome, String> {
        let Some(mut task) = resolve(self.store.as_ref(), target).await? else {
            return Ok(Outcome::failed(UPDATE_TASK_STATUS, "Task not found."));
        };
        let Some(raw) = status else {
            return Ok(Outcome::failed(
                UPDATE_TASK_STATUS,
                "Status is required for updating a task.",
            ));
        };
        let requested = match raw.parse::<TaskStatus>() {
            Ok(status) => status,
            Err(e) => return Ok(Outcome::failed(UPDATE_TASK_STATUS, e.to_string())),
        };

        match task.set_status(requested) {
            Ok(true) => {
                task = self.store.update_task(&task).await?;
                tracing::info!("Task {} moved to {}", task.id, task.status());
            }
            Ok(false) => {}
            Err(e) => return Ok(Outcome::failed(UPDATE_TASK_STATUS, e.to_string())),
        }

        Ok(Outcome::ok(
            UPDATE_TASK_STATUS,
            format!("Task '{}' updated to {}.", task.title, task.status()),
        )
        .with_task(&task))
    }

    async fn delete_task(&self, target: &TaskRef) -> Result<Outcome, String> {
        let Some(task) = resolve(self.store.as_ref(), target).await? else {
            return Ok(Outcome::failed(DELETE_TASK, "Task not found."));
        };
        if !self.store.delete_task(task.id).await? {
            return Ok(Outcome::failed(DELETE_TASK, "Task not found."));
        }
        tracing::info!("Deleted task {} ({})", task.id, task.title);
        Ok(Outcome::ok(DELETE_TASK, format!("Task '{}' deleted.", task.title)).with_task(&task))
    }

    async fn list_tasks(&self, status: Option<&str>) -> Result<Outcome, String> {
        let (tasks, count) = match status.map(str::parse::<TaskStatus>) {
            // Unrecognized filter values match nothing.
            Some(Err(_)) => (Vec::new(), 0),
            parsed => {
                let filter = match parsed {
                    Some(Ok(status)) => TaskFilter::with_status(status),
                    _ => TaskFilter::all(),
                };
                let count = self.store.count_tasks(&filter).await?;
                let tasks = self
                    .store
                    .list_tasks(&filter.limit(LIST_PREVIEW_LIMIT))
                    .await?;
                (tasks, count)
            }
        };

        let mut outcome = Outcome::ok(LIST_TASKS, format!("Found {} tasks.", count));
        outcome.tasks = Some(tasks.iter().map(TaskSummary::from).collect());
        outcome.count = Some(count);
        Ok(outcome)
    }
}
