//! Session error types.

use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Consumer failed: {0}")]
    ConsumerFailed(String),

    #[error("Trace parse error at line {line}: {message}")]
    TraceParse { line: usize, message: String },

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Session task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn consumer_failed(msg: impl Into<String>) -> Self {
        Self::ConsumerFailed(msg.into())
    }

    pub fn trace_parse(line: usize, msg: impl Into<String>) -> Self {
        Self::TraceParse {
            line,
            message: msg.into(),
        }
    }

    /// Configuration errors are raised at session start and never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::ConfigError(_))
    }
}
