//! Error types for Delve.

use thiserror::Error;

/// Library-level error type for Delve operations.
#[derive(Error, Debug)]
pub enum DelveError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("{service} returned an unexpected response: {message}")]
    Upstream { service: String, message: String },

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid tool call: {0}")]
    ToolValidation(String),

    #[error("Exceeded maximum retries ({0}) for invalid tool calls")]
    RetriesExceeded(usize),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

impl DelveError {
    /// Build an upstream error for the named service.
    pub fn upstream(service: &str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for Delve operations.
pub type Result<T> = std::result::Result<T, DelveError>;
