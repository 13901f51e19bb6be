//! SQLite-based task store.

use super::{TaskFilter, TaskStore};
use crate::task::task::validate_title;
use crate::task::{Task, TaskId, TaskStatus};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'NOT_STARTED'
        CHECK (status IN ('NOT_STARTED', 'IN_PROGRESS', 'COMPLETED')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
"#;

const TASK_COLUMNS: &str = "id, title, description, status, created_at, updated_at";

pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskStore {
    pub async fn new(base_dir: PathBuf) -> Result<Self, String> {
        let db_path = base_dir.join("tasks.db");

        tokio::fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| format!("Failed to create task store dir: {}", e))?;

        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)
                .map_err(|e| format!("Failed to open SQLite database: {}", e))?;
            conn.execute_batch(SCHEMA)
                .map_err(|e| format!("Failed to run schema: {}", e))?;
            register_unicode_lower(&conn)
                .map_err(|e| format!("Failed to register SQL functions: {}", e))?;
            tracing::info!("Opened task database at {}", db_path.display());
            Ok::<_, String>(conn)
        })
        .await
        .map_err(|e| format!("Task join error: {}", e))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Build the WHERE clause and bound values for a filter.
    fn where_clause(filter: &TaskFilter) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(ref title) = filter.title_contains {
            clauses.push("instr(unicode_lower(title), unicode_lower(?)) > 0");
            values.push(Value::Text(title.clone()));
        }
        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

/// `unicode_lower(text)`: full Unicode lowercasing, matching
/// [`TaskFilter::matches`]. SQLite's built-in `lower()` only folds ASCII.
fn register_unicode_lower(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text = ctx.get::<Option<String>>(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

/// Current time at the precision timestamps are stored with.
fn stored_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn timestamp_string(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("Invalid timestamp '{}': {}", s, e))
}

/// Raw column values, converted to a [`Task`] outside the rusqlite closure.
struct TaskRow {
    id: i64,
    title: String,
    description: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl TaskRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_task(self) -> Result<Task, String> {
        let status = self
            .status
            .parse::<TaskStatus>()
            .map_err(|e| e.to_string())?;
        Task::new(
            TaskId::new(self.id),
            self.title,
            self.description,
            status,
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.updated_at)?,
        )
        .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn create_task(&self, title: &str, description: Option<&str>) -> Result<Task, String> {
        validate_title(title).map_err(|e| e.to_string())?;
        let conn = self.conn.clone();
        let title = title.to_string();
        let description = description.map(|s| s.to_string());
        let now = stored_now();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let ts = timestamp_string(&now);
            conn.execute(
                "INSERT INTO tasks (title, description, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![&title, &description, TaskStatus::NotStarted.as_str(), &ts],
            )
            .map_err(|e| format!("Failed to insert task: {}", e))?;
            let id = TaskId::new(conn.last_insert_rowid());
            Task::new(id, title, description, TaskStatus::NotStarted, now, now)
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| e.to_string())?
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, String> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                    params![id.get()],
                    TaskRow::from_row,
                )
                .optional()
                .map_err(|e| e.to_string())?;
            row.map(TaskRow::into_task).transpose()
        })
        .await
        .map_err(|e| e.to_string())?
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, String> {
        let conn = self.conn.clone();
        let (where_sql, mut values) = Self::where_clause(filter);
        let mut sql = format!(
            "SELECT {} FROM tasks{} ORDER BY created_at DESC, id DESC",
            TASK_COLUMNS, where_sql
        );
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(limit as i64));
        }

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&sql).map_err(|e| e.to_string())?;
            let rows = stmt
                .query_map(params_from_iter(values), TaskRow::from_row)
                .map_err(|e| e.to_string())?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| e.to_string())?;
            rows.into_iter()
                .map(TaskRow::into_task)
                .collect::<Result<Vec<_>, String>>()
        })
        .await
        .map_err(|e| e.to_string())?
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> Result<usize, String> {
        let conn = self.conn.clone();
        let (where_sql, values) = Self::where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM tasks{}", where_sql);

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let count: i64 = conn
                .query_row(&sql, params_from_iter(values), |row| row.get(0))
                .map_err(|e| e.to_string())?;
            Ok(count as usize)
        })
        .await
        .map_err(|e| e.to_string())?
    }

    async fn update_task(&self, task: &Task) -> Result<Task, String> {
        validate_title(&task.title).map_err(|e| e.to_string())?;
        let conn = self.conn.clone();
        let mut updated = task.clone();
        updated.updated_at = stored_now();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let changed = conn
                .execute(
                    "UPDATE tasks SET title = ?1, description = ?2, status = ?3, updated_at = ?4
                     WHERE id = ?5",
                    params![
                        &updated.title,
                        &updated.description,
                        updated.status().as_str(),
                        timestamp_string(&updated.updated_at),
                        updated.id.get()
                    ],
                )
                .map_err(|e| format!("Failed to update task: {}", e))?;
            if changed == 0 {
                return Err(format!("Task {} not found", updated.id));
            }
            Ok(updated)
        })
        .await
        .map_err(|e| e.to_string())?
    }

    async fn delete_task(&self, id: TaskId) -> Result<bool, String> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let deleted = conn
                .execute("DELETE FROM tasks WHERE id = ?1", params![id.get()])
                .map_err(|e| format!("Failed to delete task: {}", e))?;
            Ok(deleted > 0)
        })
        .await
        .map_err(|e| e.to_string())?
    }
}
