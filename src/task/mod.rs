//! Task module - the task record and its lifecycle state machine.
//!
//! - All status changes go through [`transition::transition`]
//! - Invariants are enforced in constructors and setters
//! - Pure functions are separated from IO operations (see `crate::store`)

pub mod task;
pub mod transition;

pub use task::{Task, TaskError, TaskId, TaskStatus};
pub use transition::{allowed_next, transition};
