//! REST endpoints over the task store.

use std::sync::Arc;

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::routes::AppState;
use super::types::{
    api_error, ApiError, CreateTaskRequest, StatusQuery, TaskResponse, UpdateTaskRequest,
};
use crate::store::TaskFilter;
use crate::task::{Task, TaskId, TaskStatus};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/filter_by_status", get(filter_by_status))
        .route(
            "/:id",
            get(get_task)
                .put(update_task)
                .patch(update_task)
                .delete(delete_task),
        )
}

fn internal(e: String) -> ApiError {
    tracing::error!("Task store error: {}", e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, e)
}

fn parse_status(raw: &str) -> Result<TaskStatus, ApiError> {
    raw.parse()
        .map_err(|e: crate::task::TaskError| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

/// Path ids that are not integers get the JSON error body too.
fn task_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id).map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid task id: {}", e.body_text()),
        )
    })
}

async fn load(state: &AppState, id: i64) -> Result<Task, ApiError> {
    state
        .store
        .get_task(TaskId::new(id))
        .await
        .map_err(internal)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Task {} not found", id)))
}

async fn query_tasks(state: &AppState, status: Option<TaskStatus>) -> Result<Vec<TaskResponse>, ApiError> {
    let filter = match status {
        Some(status) => TaskFilter::with_status(status),
        None => TaskFilter::all(),
    };
    let tasks = state.store.list_tasks(&filter).await.map_err(internal)?;
    Ok(tasks.into_iter().map(TaskResponse::from).collect())
}

/// GET /api/tasks - List tasks, most recent first, optionally by status.
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let status = match query.status.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_status(raw)?),
        _ => None,
    };
    query_tasks(&state, status).await.map(Json)
}

/// GET /api/tasks/filter_by_status?status= - Status is mandatory here.
async fn filter_by_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let raw = query
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Status parameter is required"))?;
    let status = parse_status(&raw)?;
    query_tasks(&state, Some(status)).await.map(Json)
}

/// POST /api/tasks - Create a task in `NOT_STARTED`.
async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Task title cannot be empty"));
    }
    let description = req.description.as_deref().filter(|d| !d.trim().is_empty());
    let task = state
        .store
        .create_task(title, description)
        .await
        .map_err(internal)?;
    tracing::info!("Created task {} via REST", task.id);
    Ok((StatusCode::CREATED, Json(task.into())))
}

/// GET /api/tasks/:id
async fn get_task(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let id = task_id(path)?;
    load(&state, id).await.map(|t| Json(t.into()))
}

/// PUT|PATCH /api/tasks/:id - Apply the provided fields.
async fn update_task(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let id = task_id(path)?;
    let mut task = load(&state, id).await?;

    if let Some(title) = req.title {
        task.rename(title.trim().to_string())
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    }
    if let Some(description) = req.description {
        task.description = Some(description).filter(|d| !d.trim().is_empty());
    }
    if let Some(ref raw) = req.status {
        let requested = parse_status(raw)?;
        task.set_status(requested)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    }

    let task = state.store.update_task(&task).await.map_err(internal)?;
    Ok(Json(task.into()))
}

/// DELETE /api/tasks/:id
async fn delete_task(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = task_id(path)?;
    if state
        .store
        .delete_task(TaskId::new(id))
        .await
        .map_err(internal)?
    {
        tracing::info!("Deleted task {} via REST", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(StatusCode::NOT_FOUND, format!("Task {} not found", id)))
    }
}
