//! HTTP route handlers and server bootstrap.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::command;
use super::tasks as tasks_api;
use super::types::HealthResponse;
use crate::assistant::{IntentDispatcher, IntentInterpreter};
use crate::config::Config;
use crate::llm::{LlmClient, OpenAiCompatibleClient};
use crate::store::{create_task_store, TaskStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn TaskStore>,
    pub interpreter: IntentInterpreter,
    pub dispatcher: IntentDispatcher,
}

impl AppState {
    /// Wire the assistant pipeline around an LLM client and a task store.
    pub fn new(config: Config, store: Arc<dyn TaskStore>, client: Arc<dyn LlmClient>) -> Self {
        let interpreter = IntentInterpreter::new(client, config.llm.model.clone())
            .with_sampling(config.llm.temperature, config.llm.max_tokens)
            .with_batching(config.batch_intents);
        let dispatcher = IntentDispatcher::new(Arc::clone(&store));
        Self {
            config,
            store,
            interpreter,
            dispatcher,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/command", post(command::run_command))
        .nest("/api/tasks", tasks_api::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let client: Arc<dyn LlmClient> = Arc::new(OpenAiCompatibleClient::new(
        config.llm.api_key.clone(),
        config.llm.api_url.clone(),
        config.llm.timeout,
    )?);

    let store = create_task_store(config.store_type, config.data_dir.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open task store: {}", e))?;
    tracing::info!(
        "Task store ready: {:?} (persistent: {})",
        config.store_type,
        store.is_persistent()
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, store, client));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    // Setup graceful shutdown on SIGTERM/SIGINT
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store_persistent: state.store.is_persistent(),
        model: state.config.llm.model.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, ChatResponse};
    use crate::store::{InMemoryTaskStore, TaskFilter};
    use crate::task::TaskStatus;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Always answers with the same completion text, or fails.
    struct FixedReply(Result<String, String>);

    #[async_trait]
    impl LlmClient for FixedReply {
        async fn chat_completion(
            &self,
            model: &str,
            _messages: &[ChatMessage],
        ) -> anyhow::Result<ChatResponse> {
            match &self.0 {
                Ok(text) => Ok(ChatResponse {
                    content: Some(text.clone()),
                    finish_reason: Some("stop".into()),
                    usage: None,
                    model: Some(model.to_string()),
                }),
                Err(e) => Err(anyhow::anyhow!("{}", e)),
            }
        }
    }

    fn app_with(reply: Result<&str, &str>) -> (Router, Arc<dyn TaskStore>) {
        let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
        let client = Arc::new(FixedReply(
            reply.map(str::to_string).map_err(str::to_string),
        ));
        let config = Config::new("test-key".into(), "test-model".into());
        let state = Arc::new(AppState::new(config, Arc::clone(&store), client));
        (router(state), store)
    }

    fn app() -> (Router, Arc<dyn TaskStore>) {
        app_with(Ok(r#"{"action": "list_tasks", "params": {}}"#))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = send(app, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store_persistent"], false);
        assert_eq!(body["model"], "test-model");
    }

    #[tokio::test]
    async fn test_command_requires_text() {
        for body in [json!({}), json!({"command": "   "})] {
            let (app, _) = app();
            let (status, body) = send(app, "POST", "/api/command", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({"error": "Command is required"}));
        }
    }

    #[tokio::test]
    async fn test_command_creates_tasks() {
        let (app, store) = app_with(Ok(
            r#"{"actions": [{"action": "create_task", "params": {"title": "Buy milk"}}, {"action": "create_task", "params": {"title": "Buy eggs"}}]}"#,
        ));
        let (status, body) = send(
            app,
            "POST",
            "/api/command",
            Some(json!({"command": "add buy milk and buy eggs"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["original_command"], "add buy milk and buy eggs");
        assert!(body["interpreted_intent"]["actions"].is_array());
        assert_eq!(body["result"]["message"], "Processed 2 actions. 2 succeeded.");
        assert_eq!(body["result"]["results"][1]["task"]["status"], "NOT_STARTED");
        assert_eq!(store.count_tasks(&TaskFilter::all()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_command_single_outcome() {
        let (app, store) = app();
        store.create_task("Existing", None).await.unwrap();
        let (status, body) = send(
            app,
            "POST",
            "/api/command",
            Some(json!({"command": "what's on my list?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["action"], "list_tasks");
        assert_eq!(body["result"]["message"], "Found 1 tasks.");
        assert_eq!(body["result"]["count"], 1);
    }

    #[tokio::test]
    async fn test_command_unrecognized() {
        let (app, _) = app_with(Ok(r#"{"action": "unknown", "message": "Could not understand command"}"#));
        let (status, body) = send(app, "POST", "/api/command", Some(json!({"command": "sing"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "I didn't understand that command.");
        assert_eq!(body["intent"]["action"], "unknown");
    }

    #[tokio::test]
    async fn test_command_interpretation_failure() {
        let (app, _) = app_with(Err("Network error: connection refused"));
        let (status, body) = send(app, "POST", "/api/command", Some(json!({"command": "add x"}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Network error: connection refused");

        let (app, _) = app_with(Ok("not json at all"));
        let (status, body) = send(app, "POST", "/api/command", Some(json!({"command": "add x"}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Failed to parse AI response");
    }

    #[tokio::test]
    async fn test_task_crud() {
        let (app, _) = app();

        let (status, created) = send(
            app.clone(),
            "POST",
            "/api/tasks",
            Some(json!({"title": "Write report", "description": "Q3 numbers"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "NOT_STARTED");
        let id = created["id"].as_i64().unwrap();

        let (status, fetched) = send(app.clone(), "GET", &format!("/api/tasks/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["description"], "Q3 numbers");

        let (status, updated) = send(
            app.clone(),
            "PATCH",
            &format!("/api/tasks/{}", id),
            Some(json!({"status": "IN_PROGRESS", "title": "Write Q3 report"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "IN_PROGRESS");
        assert_eq!(updated["title"], "Write Q3 report");

        let (status, listed) = send(app.clone(), "GET", "/api/tasks?status=IN_PROGRESS", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, _) = send(app.clone(), "DELETE", &format!("/api/tasks/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(app, "GET", &format!("/api/tasks/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], format!("Task {} not found", id));
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_transition() {
        let (app, store) = app();
        let task = store.create_task("Plan", None).await.unwrap();

        let (status, body) = send(
            app,
            "PUT",
            &format!("/api/tasks/{}", task.id),
            Some(json!({"status": "COMPLETED"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Invalid state transition from NOT_STARTED to COMPLETED"
        );
        let stored = store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(stored.status(), TaskStatus::NotStarted);
    }

    #[tokio::test]
    async fn test_filter_by_status_requires_status() {
        let (app, store) = app();
        store.create_task("Idle", None).await.unwrap();

        let (status, body) = send(app.clone(), "GET", "/api/tasks/filter_by_status", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(
            app,
            "GET",
            "/api/tasks/filter_by_status?status=NOT_STARTED",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["title"], "Idle");
    }

    #[tokio::test]
    async fn test_non_numeric_id_returns_json_error() {
        for method in ["GET", "DELETE"] {
            let (app, _) = app();
            let (status, body) = send(app, method, "/api/tasks/abc", None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"]
                .as_str()
                .unwrap()
                .starts_with("Invalid task id"));
        }

        let (app, _) = app();
        let (status, body) = send(
            app,
            "PATCH",
            "/api/tasks/abc",
            Some(json!({"status": "IN_PROGRESS"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}

