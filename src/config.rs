//! Configuration management for taskdesk.
//!
//! Configuration can be set via environment variables:
//! - `LLM_API_KEY` - Required (falls back to `GROQ_API_KEY`). Provider API key.
//! - `LLM_API_URL` - Optional. Chat completions endpoint. Defaults to Groq's.
//! - `DEFAULT_MODEL` - Optional. Model id. Defaults to `llama-3.3-70b-versatile`.
//! - `LLM_TEMPERATURE` - Optional. Sampling temperature. Defaults to `0.1`.
//! - `LLM_MAX_TOKENS` - Optional. Output token bound. Defaults to `500`.
//! - `LLM_TIMEOUT_SECS` - Optional. HTTP timeout for model calls. Defaults to `60`.
//! - `ASSISTANT_BATCH_INTENTS` - Optional. Keep every intent of a multi-action
//!   command (`true`) or only the first (`false`). Defaults to `true`.
//! - `TASK_STORE` - Optional. `sqlite` or `memory`. Defaults to `sqlite`.
//! - `DATA_DIR` - Optional. Directory holding `tasks.db`. Defaults to `./data`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::assistant::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::llm::DEFAULT_API_URL;
use crate::store::TaskStoreType;

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Model provider settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,

    /// OpenAI-compatible chat completions URL
    pub api_url: String,

    pub model: String,

    pub temperature: f64,

    pub max_tokens: u64,

    /// Transport timeout for a single completion request
    pub timeout: Duration,
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,

    /// Dispatch every intent of a multi-action command
    pub batch_intents: bool,

    pub store_type: TaskStoreType,

    /// Directory for persistent storage
    pub data_dir: PathBuf,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if neither `LLM_API_KEY` nor
    /// `GROQ_API_KEY` is set, and `ConfigError::InvalidValue` for values
    /// that fail to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("LLM_API_KEY")
            .or_else(|_| std::env::var("GROQ_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("LLM_API_KEY".to_string()))?;

        let api_url =
            std::env::var("LLM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let model = std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let temperature = parse_var("LLM_TEMPERATURE", DEFAULT_TEMPERATURE)?;
        let max_tokens = parse_var("LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS)?;
        let timeout_secs: u64 = parse_var("LLM_TIMEOUT_SECS", 60)?;

        let batch_intents = match std::env::var("ASSISTANT_BATCH_INTENTS") {
            Ok(value) => parse_bool(&value).ok_or_else(|| {
                ConfigError::InvalidValue("ASSISTANT_BATCH_INTENTS".to_string(), value)
            })?,
            Err(_) => true,
        };

        let store_type = std::env::var("TASK_STORE")
            .map(|s| TaskStoreType::from_str(&s))
            .unwrap_or_default();

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = parse_var("PORT", 8000)?;

        Ok(Self {
            llm: LlmConfig {
                api_key,
                api_url,
                model,
                temperature,
                max_tokens,
                timeout: Duration::from_secs(timeout_secs),
            },
            batch_intents,
            store_type,
            data_dir,
            host,
            port,
        })
    }

    /// Create a config with custom values (useful for testing).
    ///
    /// Uses the in-memory store so nothing touches disk.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            llm: LlmConfig {
                api_key,
                api_url: DEFAULT_API_URL.to_string(),
                model,
                temperature: DEFAULT_TEMPERATURE,
                max_tokens: DEFAULT_MAX_TOKENS,
                timeout: Duration::from_secs(60),
            },
            batch_intents: true,
            store_type: TaskStoreType::Memory,
            data_dir: PathBuf::from("./data"),
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
