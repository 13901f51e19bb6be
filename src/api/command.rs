//! `POST /api/command`: natural language in, task operations out.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::routes::AppState;
use super::types::{api_error, ApiError, CommandRequest, CommandResponse, UnrecognizedResponse};
use crate::assistant::Interpretation;

const NOT_UNDERSTOOD: &str = "I didn't understand that command.";

/// Interpret a command and dispatch the resulting intents.
///
/// A body that is missing, malformed, or carries a blank command is a 400.
/// Interpretation failures map to 503 since they originate upstream.
pub async fn run_command(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<CommandRequest>>,
) -> Result<Response, ApiError> {
    let command = payload
        .and_then(|Json(req)| req.command)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Command is required"))?;

    tracing::info!("Received command: {}", command);

    match state.interpreter.interpret(&command).await {
        Interpretation::Failed { message } => {
            tracing::warn!("Could not interpret command: {}", message);
            Err(api_error(StatusCode::SERVICE_UNAVAILABLE, message))
        }
        Interpretation::Unrecognized { message, raw } => {
            tracing::debug!("Command not recognized: {}", message);
            Ok(Json(UnrecognizedResponse {
                message: NOT_UNDERSTOOD.to_string(),
                intent: raw,
            })
            .into_response())
        }
        Interpretation::Intents { intents, raw } => {
            let result = state.dispatcher.dispatch(&intents).await;
            tracing::info!(
                "Command handled: success={} message={}",
                result.success(),
                result.message()
            );
            Ok(Json(CommandResponse {
                original_command: command,
                interpreted_intent: raw,
                result,
            })
            .into_response())
        }
    }
}
