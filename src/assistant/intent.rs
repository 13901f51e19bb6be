//! Structured intents produced from natural-language commands.
//!
//! The model replies with `{"action": <tag>, "params": {...}}` objects whose
//! parameter keys depend on the action. [`Intent::from_value`] validates that
//! shape once, at the boundary, into a closed set of variants.

use serde_json::{Map, Value};

use crate::task::TaskId;

pub const CREATE_TASK: &str = "create_task";
pub const UPDATE_TASK_STATUS: &str = "update_task_status";
pub const DELETE_TASK: &str = "delete_task";
pub const LIST_TASKS: &str = "list_tasks";
pub const UNKNOWN: &str = "unknown";
pub const ERROR: &str = "error";

/// A loose reference to a task: an exact id, a title fragment, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskRef {
    pub task_id: Option<TaskId>,
    pub title: Option<String>,
}

impl TaskRef {
    pub fn by_id(id: TaskId) -> Self {
        Self {
            task_id: Some(id),
            title: None,
        }
    }

    pub fn by_title(title: impl Into<String>) -> Self {
        Self {
            task_id: None,
            title: Some(title.into()),
        }
    }

    fn from_params(params: &Map<String, Value>) -> Self {
        Self {
            task_id: task_id_param(params),
            title: string_param(params, "title"),
        }
    }
}

/// One requested action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    CreateTask {
        title: Option<String>,
        description: Option<String>,
    },
    UpdateTaskStatus {
        target: TaskRef,
        /// Raw status text; parsed by the dispatcher after the task resolves.
        status: Option<String>,
    },
    DeleteTask {
        target: TaskRef,
    },
    ListTasks {
        status: Option<String>,
    },
    /// The model could not work out what was asked, or sent no action.
    Unknown {
        message: Option<String>,
    },
    /// The model reported a failure of its own.
    Error {
        message: String,
    },
    /// Any action tag outside the supported set.
    Unsupported {
        action: String,
    },
}

impl Intent {
    /// Validate a JSON value into an intent.
    ///
    /// Returns `None` when the value is not an object; every object yields
    /// some intent, with missing or mistyped parameters treated as absent.
    pub fn from_value(value: &Value) -> Option<Intent> {
        let obj = value.as_object()?;
        let empty = Map::new();
        let params = obj.get("params").and_then(Value::as_object).unwrap_or(&empty);
        let message = string_param(obj, "message").or_else(|| string_param(params, "message"));

        let action = match obj.get("action").and_then(Value::as_str).map(str::trim) {
            Some(action) if !action.is_empty() => action,
            _ => return Some(Intent::Unknown { message }),
        };

        let intent = match action {
            CREATE_TASK => Intent::CreateTask {
                title: string_param(params, "title"),
                description: string_param(params, "description"),
            },
            UPDATE_TASK_STATUS => Intent::UpdateTaskStatus {
                target: TaskRef::from_params(params),
                status: string_param(params, "status"),
            },
            DELETE_TASK => Intent::DeleteTask {
                target: TaskRef::from_params(params),
            },
            LIST_TASKS => Intent::ListTasks {
                status: string_param(params, "status"),
            },
            UNKNOWN => Intent::Unknown { message },
            ERROR => Intent::Error {
                message: message.unwrap_or_else(|| "Unknown error".to_string()),
            },
            other => Intent::Unsupported {
                action: other.to_string(),
            },
        };
        Some(intent)
    }

    /// The wire action tag.
    pub fn action(&self) -> &str {
        match self {
            Intent::CreateTask { .. } => CREATE_TASK,
            Intent::UpdateTaskStatus { .. } => UPDATE_TASK_STATUS,
            Intent::DeleteTask { .. } => DELETE_TASK,
            Intent::ListTasks { .. } => LIST_TASKS,
            Intent::Unknown { .. } => UNKNOWN,
            Intent::Error { .. } => ERROR,
            Intent::Unsupported { action } => action,
        }
    }

    /// `unknown` and `error` replies carry no action to execute.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Intent::Unknown { .. } | Intent::Error { .. })
    }
}

/// Non-blank string parameter. Numbers and booleans are accepted as text.
fn string_param(params: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match params.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// `task_id` as an integer, an integral float, or a numeric string.
fn task_id_param(params: &Map<String, Value>) -> Option<TaskId> {
    match params.get("task_id")? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(TaskId::new),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_task() {
        let intent = Intent::from_value(&json!({
            "action": "create_task",
            "params": {"title": "Buy milk", "description": "  "}
        }));
        assert_eq!(
            intent,
            Some(Intent::CreateTask {
                title: Some("Buy milk".into()),
                description: None,
            })
        );
    }

    #[test]
    fn test_update_by_numeric_and_string_id() {
        for id in [json!(5), json!("5"), json!(5.0)] {
            let intent = Intent::from_value(&json!({
                "action": "update_task_status",
                "params": {"task_id": id, "status": "COMPLETED"}
            }))
            .unwrap();
            assert_eq!(
                intent,
                Intent::UpdateTaskStatus {
                    target: TaskRef::by_id(TaskId::new(5)),
                    status: Some("COMPLETED".into()),
                }
            );
        }
    }

    #[test]
    fn test_delete_by_title() {
        let intent = Intent::from_value(&json!({
            "action": "delete_task",
            "params": {"title": "meeting"}
        }))
        .unwrap();
        assert_eq!(
            intent,
            Intent::DeleteTask {
                target: TaskRef::by_title("meeting")
            }
        );
    }

    #[test]
    fn test_list_without_params() {
        let intent = Intent::from_value(&json!({"action": "list_tasks"})).unwrap();
        assert_eq!(intent, Intent::ListTasks { status: None });
    }

    #[test]
    fn test_sentinels() {
        let unknown = Intent::from_value(&json!({
            "action": "unknown",
            "message": "Could not understand command"
        }))
        .unwrap();
        assert_eq!(
            unknown,
            Intent::Unknown {
                message: Some("Could not understand command".into())
            }
        );
        assert!(unknown.is_sentinel());

        let missing = Intent::from_value(&json!({"params": {"title": "x"}})).unwrap();
        assert_eq!(missing, Intent::Unknown { message: None });

        let error = Intent::from_value(&json!({"action": "error"})).unwrap();
        assert_eq!(
            error,
            Intent::Error {
                message: "Unknown error".into()
            }
        );
    }

    #[test]
    fn test_unsupported_action_keeps_tag() {
        let intent = Intent::from_value(&json!({"action": "rename_task", "params": {}})).unwrap();
        assert_eq!(intent.action(), "rename_task");
        assert!(!intent.is_sentinel());
    }

    #[test]
    fn test_non_object_is_not_an_intent() {
        assert_eq!(Intent::from_value(&json!("create_task")), None);
        assert_eq!(Intent::from_value(&json!(42)), None);
        assert_eq!(Intent::from_value(&json!([{"action": "list_tasks"}])), None);
    }

    #[test]
    fn test_mistyped_params_are_absent() {
        let intent = Intent::from_value(&json!({
            "action": "update_task_status",
            "params": {"task_id": "five", "title": ["a"], "status": null}
        }))
        .unwrap();
        assert_eq!(
            intent,
            Intent::UpdateTaskStatus {
                target: TaskRef::default(),
                status: None,
            }
        );
    }
}
