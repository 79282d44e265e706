//! Error types for the event emitter

use crate::core::error_handling::BoxError;
use crate::events::emitter::ListenerId;
use thiserror::Error;

pub type EventResult<T> = Result<T, EventError>;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Listener {listener:?} failed while handling '{event}'")]
    ListenerFailed {
        event: String,
        listener: ListenerId,
        #[source]
        source: BoxError,
    },
}

impl crate::core::error_handling::ContextualError for EventError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}
