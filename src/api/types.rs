//! API request and response types.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assistant::DispatchResult;
use crate::task::{Task, TaskId, TaskStatus};

/// Error body shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error: status code plus `{"error": ...}` body.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Request to run a natural-language command.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub command: Option<String>,
}

/// A command that was interpreted and dispatched.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub original_command: String,

    /// The model's reply as parsed JSON, before validation
    pub interpreted_intent: Value,

    pub result: DispatchResult,
}

/// A command the model could not map to any action.
#[derive(Debug, Clone, Serialize)]
pub struct UnrecognizedResponse {
    pub message: String,
    pub intent: Value,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Whether tasks survive a restart
    pub store_persistent: bool,

    /// Model used for interpretation
    pub model: String,
}

/// Full task representation for the REST endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            status: task.status(),
            title: task.title,
            description: task.description,
            created_at: task.created_at.to_rfc3339(),
            updated_at: task.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update. Status changes go through the lifecycle guard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}
