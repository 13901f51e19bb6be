//! HTTP API for taskdesk.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `POST /api/command` - Run a natural-language command
//! - `GET /api/tasks` - List tasks (optional `?status=`)
//! - `POST /api/tasks` - Create a task
//! - `GET /api/tasks/filter_by_status?status=` - List tasks in one status
//! - `GET /api/tasks/{id}` - Get a task
//! - `PUT|PATCH /api/tasks/{id}` - Update title, description or status
//! - `DELETE /api/tasks/{id}` - Delete a task

mod command;
mod routes;
mod tasks;
pub mod types;

pub use routes::{router, serve, AppState};
