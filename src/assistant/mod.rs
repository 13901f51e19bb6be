//! Natural-language task assistant.
//!
//! A command flows through three stages:
//! 1. [`IntentInterpreter`] asks the model for structured [`Intent`]s
//! 2. [`IntentDispatcher`] runs them in order, resolving task references
//!    with [`resolve`] and guarding status changes
//! 3. the outcomes are aggregated into a [`DispatchResult`]

mod dispatcher;
mod intent;
mod interpreter;
mod resolver;

pub use dispatcher::{
    AggregatedResponse, DispatchResult, IntentDispatcher, Outcome, Rejection, TaskSummary,
    LIST_PREVIEW_LIMIT,
};
pub use intent::{Intent, TaskRef};
pub use interpreter::{
    normalize, strip_code_fences, IntentInterpreter, Interpretation, DEFAULT_MAX_TOKENS,
    DEFAULT_TEMPERATURE, SYSTEM_INSTRUCTION,
};
pub use resolver::resolve;
