//! Structured session logging utilities.
//!
//! Provides consistent, structured logging for session lifecycle events
//! with tracing spans and contextual information.

use tracing::{error, info, warn, Span};

use cpilot_models::SessionId;

/// Session logger for structured logging with consistent formatting.
///
/// Every record carries the session ID and the component that emitted it
/// (sampler, jitter, state, consumer).
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: String,
    component: String,
}

impl SessionLogger {
    /// Create a new logger for a session component.
    pub fn new(session_id: &SessionId, component: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            component: component.to_string(),
        }
    }

    /// Logger for another component of the same session.
    pub fn for_component(&self, component: &str) -> Self {
        Self {
            session_id: self.session_id.clone(),
            component: component.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            component = %self.component,
            "Session started: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            session_id = %self.session_id,
            component = %self.component,
            "Session warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            session_id = %self.session_id,
            component = %self.component,
            "Session error: {}", message
        );
    }

    pub fn log_stop(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            component = %self.component,
            "Session stopped: {}", message
        );
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// Create a tracing span for a session task.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "session",
            session_id = %self.session_id,
            component = %self.component
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_logger_creation() {
        let session_id = SessionId::new();
        let logger = SessionLogger::new(&session_id, "sampler");

        assert_eq!(logger.session_id(), session_id.to_string());
        assert_eq!(logger.component(), "sampler");
    }

    #[test]
    fn test_for_component_keeps_session() {
        let logger = SessionLogger::new(&SessionId::from_string("s-1"), "session");
        let jitter = logger.for_component("jitter");

        assert_eq!(jitter.session_id(), "s-1");
        assert_eq!(jitter.component(), "jitter");
    }
}
