//! # taskdesk
//!
//! Task manager driven by natural-language commands.
//!
//! ## Command Flow
//!
//! ```text
//!   "add buy milk and start the report"
//!                  │
//!                  ▼
//!        ┌───────────────────┐
//!        │ IntentInterpreter │──── LlmClient (OpenAI-compatible)
//!        └─────────┬─────────┘
//!                  │ Vec<Intent>
//!                  ▼
//!        ┌───────────────────┐
//!        │ IntentDispatcher  │──── resolver, transition guard
//!        └─────────┬─────────┘
//!                  │
//!                  ▼
//!             TaskStore (memory | sqlite)
//! ```
//!
//! ## Modules
//! - `api`: axum server, command endpoint and task REST endpoints
//! - `assistant`: interpretation, resolution and dispatch of intents
//! - `llm`: chat-completions client abstraction
//! - `store`: pluggable task persistence
//! - `task`: task model and lifecycle guard

pub mod api;
pub mod assistant;
pub mod config;
pub mod llm;
pub mod store;
pub mod task;
