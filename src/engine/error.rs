//! Engine error types

use crate::core::error_handling::{BoxError, ContextualError};
use crate::engine::state::{AppOperation, EngineState};
use crate::events::api::EventError;
use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// `run()` called while a run is in progress or after a crash
    #[error("Engine is not idle")]
    NotIdle { state: EngineState },

    #[error("Application failed during {operation}")]
    Application {
        operation: AppOperation,
        #[source]
        source: BoxError,
    },

    #[error("Engine event delivery failed")]
    Event(#[from] EventError),

    #[error("Run panicked: {message}")]
    Panicked { message: String },

    #[error("Failed to build the engine runtime")]
    Runtime {
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub const NOT_IDLE: &'static str = "ENGINE_NOT_IDLE";

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NotIdle { .. } => Self::NOT_IDLE,
            EngineError::Application { .. } => "ENGINE_APPLICATION_FAILED",
            EngineError::Event(_) => "ENGINE_EVENT_FAILED",
            EngineError::Panicked { .. } => "ENGINE_PANICKED",
            EngineError::Runtime { .. } => "ENGINE_RUNTIME_FAILED",
        }
    }
}

impl ContextualError for EngineError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, EngineError::NotIdle { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            EngineError::NotIdle { .. } => Some("Engine is not idle"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_not_idle_has_fixed_message_and_code() {
        for state in [EngineState::Running, EngineState::Crashed] {
            let error = EngineError::NotIdle { state };
            assert_eq!(error.to_string(), "Engine is not idle");
            assert_eq!(error.code(), "ENGINE_NOT_IDLE");
            assert!(error.is_user_actionable());
        }
    }

    #[test]
    fn test_application_error_keeps_source() {
        let error = EngineError::Application {
            operation: AppOperation::Start,
            source: "port in use".into(),
        };
        assert_eq!(error.to_string(), "Application failed during start");
        assert_eq!(error.source().unwrap().to_string(), "port in use");
        assert_eq!(error.code(), "ENGINE_APPLICATION_FAILED");
        assert_eq!(error.user_message(), None);
    }
}
