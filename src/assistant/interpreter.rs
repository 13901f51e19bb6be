//! Natural-language command interpretation.
//!
//! The interpreter sends a fixed system instruction and the raw command to the
//! injected [`LlmClient`], then normalizes whatever JSON comes back into an
//! [`Interpretation`]. It keeps no state between calls.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;

use super::intent::Intent;
use crate::llm::{ChatMessage, ChatOptions, LlmClient, ResponseFormat};

pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_MAX_TOKENS: u64 = 500;

const PARSE_FAILURE: &str = "Failed to parse AI response";
const INVALID_STRUCTURE: &str = "AI returned invalid JSON structure";
const EMPTY_LIST: &str = "AI returned an empty list";
const UNCLEAR_COMMAND: &str = "Could not understand command";

const CODE_FENCE_REGEX: &str = r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)\s*```$";

/// System prompt for command interpretation.
pub const SYSTEM_INSTRUCTION: &str = r#"You are an AI assistant for a Task Management System.
Your job is to interpret user natural language commands and convert them into structured JSON actions.

The system supports the following actions:
1. 'create_task': Create a new task. Params: "title" (required), "description" (optional).
2. 'update_task_status': Change the status of a task. Params: "task_id" or "title", and "status".
3. 'delete_task': Delete a task. Params: "task_id" or "title".
4. 'list_tasks': Show tasks, optionally filtered by status. Params: "status" (optional).

Task Statuses: 'NOT_STARTED', 'IN_PROGRESS', 'COMPLETED'.

CRITICAL: You must respond with ONLY valid JSON.
If the user requests multiple actions (e.g., "Add task 1 and task 2"), return a LIST of JSON objects,
either as a bare array or wrapped as {"actions": [...]}.
If it is a single action, return a single JSON object or a list with one object.

Output Format Examples:
- User: "Add a task to buy milk"
  Output: {"actions": [{"action": "create_task", "params": {"title": "Buy milk"}}]}

- User: "Add task A and task B"
  Output: {"actions": [
      {"action": "create_task", "params": {"title": "Task A"}},
      {"action": "create_task", "params": {"title": "Task B"}}
  ]}

- User: "Mark task 5 as completed"
  Output: {"actions": [{"action": "update_task_status", "params": {"task_id": 5, "status": "COMPLETED"}}]}

- User: "Start working on the presentation"
  Output: {"actions": [{"action": "update_task_status", "params": {"title": "presentation", "status": "IN_PROGRESS"}}]}

- User: "Show me all completed tasks"
  Output: {"actions": [{"action": "list_tasks", "params": {"status": "COMPLETED"}}]}

- User: "Delete the task about meeting"
  Output: {"actions": [{"action": "delete_task", "params": {"title": "meeting"}}]}

If the intent is unclear, return {"action": "unknown", "message": "Could not understand command"}

Remember: ONLY output valid JSON, nothing else."#;

/// Normalized result of interpreting one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// One or more intents to dispatch, in the order the model gave them.
    Intents { intents: Vec<Intent>, raw: Value },
    /// The model could not tell what the user wanted.
    Unrecognized { message: String, raw: Value },
    /// The model call failed or its reply was unusable.
    Failed { message: String },
}

/// Turns free-form commands into intents via an LLM.
pub struct IntentInterpreter {
    client: Arc<dyn LlmClient>,
    model: String,
    options: ChatOptions,
    batching: bool,
}

impl IntentInterpreter {
    /// Create an interpreter with low-temperature, JSON-only defaults.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            options: ChatOptions {
                temperature: Some(DEFAULT_TEMPERATURE),
                max_tokens: Some(DEFAULT_MAX_TOKENS),
                response_format: Some(ResponseFormat::JsonObject),
            },
            batching: true,
        }
    }

    pub fn with_sampling(mut self, temperature: f64, max_tokens: u64) -> Self {
        self.options.temperature = Some(temperature);
        self.options.max_tokens = Some(max_tokens);
        self
    }

    /// When disabled, only the first intent of a multi-action reply is kept.
    pub fn with_batching(mut self, batching: bool) -> Self {
        self.batching = batching;
        self
    }

    /// Interpret a single user command.
    pub async fn interpret(&self, command: &str) -> Interpretation {
        let messages = [
            ChatMessage::system(SYSTEM_INSTRUCTION),
            ChatMessage::user(command),
        ];

        let response = match self
            .client
            .chat_completion_with_options(&self.model, &messages, self.options.clone())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Interpretation call failed: {}", e);
                return Interpretation::Failed {
                    message: e.to_string(),
                };
            }
        };

        let text = match response.content {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                tracing::warn!("Model returned an empty reply");
                return Interpretation::Failed {
                    message: "AI returned an empty response".to_string(),
                };
            }
        };

        let value: Value = match serde_json::from_str(strip_code_fences(&text)) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to parse AI response: {} (response text: {})", e, text);
                return Interpretation::Failed {
                    message: PARSE_FAILURE.to_string(),
                };
            }
        };

        let interpretation = normalize(value, self.batching);
        if let Interpretation::Intents { ref intents, .. } = interpretation {
            tracing::debug!("Interpreted command into {} intent(s)", intents.len());
        }
        interpretation
    }
}

fn code_fence_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CODE_FENCE_REGEX).ok()).as_ref()
}

/// Remove a surrounding markdown code fence (```json ... ```), if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    code_fence_regex()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed)
}

/// Map a parsed model reply onto an [`Interpretation`].
pub fn normalize(value: Value, batching: bool) -> Interpretation {
    let wrapped = match value {
        Value::Object(ref obj) if !obj.contains_key("action") => obj
            .get("actions")
            .or_else(|| obj.get("intents"))
            .and_then(Value::as_array)
            .cloned(),
        _ => None,
    };

    match (wrapped, value) {
        (Some(items), raw) => normalize_list(items, raw, batching),
        (None, Value::Array(items)) => {
            let raw = Value::Array(items.clone());
            normalize_list(items, raw, batching)
        }
        (None, raw @ Value::Object(_)) => normalize_single(raw),
        (None, _) => Interpretation::Failed {
            message: INVALID_STRUCTURE.to_string(),
        },
    }
}

fn normalize_single(raw: Value) -> Interpretation {
    match Intent::from_value(&raw) {
        Some(intent) => from_intents(vec![intent], raw),
        None => Interpretation::Failed {
            message: INVALID_STRUCTURE.to_string(),
        },
    }
}

fn normalize_list(items: Vec<Value>, raw: Value, batching: bool) -> Interpretation {
    if items.is_empty() {
        return Interpretation::Unrecognized {
            message: EMPTY_LIST.to_string(),
            raw,
        };
    }
    if !items.iter().all(Value::is_object) {
        return Interpretation::Failed {
            message: INVALID_STRUCTURE.to_string(),
        };
    }

    if !batching {
        if items.len() > 1 {
            tracing::debug!("Batching disabled, dropping {} extra intent(s)", items.len() - 1);
        }
        let first = items.into_iter().next().unwrap_or(Value::Null);
        return normalize_single(first);
    }

    let intents: Vec<Intent> = items.iter().filter_map(Intent::from_value).collect();
    from_intents(intents, raw)
}

/// Sentinel handling: a reply made only of sentinels is decided by the first.
fn from_intents(intents: Vec<Intent>, raw: Value) -> Interpretation {
    if intents.iter().all(Intent::is_sentinel) {
        match intents.into_iter().next() {
            Some(Intent::Error { message }) => Interpretation::Failed { message },
            Some(Intent::Unknown { message }) => Interpretation::Unrecognized {
                message: message.unwrap_or_else(|| UNCLEAR_COMMAND.to_string()),
                raw,
            },
            _ => Interpretation::Unrecognized {
                message: EMPTY_LIST.to_string(),
                raw,
            },
        }
    } else {
        Interpretation::Intents { intents, raw }
    }
}
