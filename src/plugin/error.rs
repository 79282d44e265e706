//! Plugin Error Handling
//!
//! `PluginError` is what registration, loading, removal and queries return.
//! `FactoryError` is what the object factory returns; the manager never lets
//! it escape unwrapped.

use crate::core::error_handling::BoxError;
use crate::plugin::types::{PluginHook, PluginId};
use thiserror::Error;

/// Result type alias for plugin operations
pub type PluginResult<T> = std::result::Result<T, PluginError>;

/// Result type alias for object factory operations
pub type FactoryResult<T> = std::result::Result<T, FactoryError>;

#[derive(Error, Debug)]
pub enum PluginError {
    /// Bad input from the caller, e.g. registering an identity twice
    #[error("{message}")]
    InvalidArgument { message: String },

    /// Operation not allowed in the manager's current state
    #[error("{message}")]
    InvalidState { message: String },

    #[error("Plugin '{plugin_id}' has not been registered")]
    NotFound { plugin_id: PluginId },

    #[error("Circular dependency: plugin '{dependent}' depends on '{dependency}', which is still loading")]
    CircularDependency {
        dependent: PluginId,
        dependency: PluginId,
    },

    /// The object factory could not construct the plugin, or the plugin could
    /// not wire its bindings into it
    #[error("Dependency injection failed for plugin '{plugin_id}'")]
    DependencyInjection {
        plugin_id: PluginId,
        #[source]
        source: BoxError,
    },

    #[error("Plugin '{plugin_id}' failed during {hook}")]
    Hook {
        plugin_id: PluginId,
        hook: PluginHook,
        #[source]
        source: BoxError,
    },
}

impl PluginError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        PluginError::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        PluginError::InvalidState {
            message: message.into(),
        }
    }
}

impl crate::core::error_handling::ContextualError for PluginError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            PluginError::InvalidArgument { .. }
                | PluginError::InvalidState { .. }
                | PluginError::NotFound { .. }
                | PluginError::CircularDependency { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            PluginError::InvalidArgument { message } | PluginError::InvalidState { message } => {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("No plugin type is known for identity '{plugin_id}'")]
    UnknownPlugin { plugin_id: PluginId },

    #[error("No binding registered for service '{key}'")]
    UnknownService { key: String },

    #[error("Constructor for '{target}' failed")]
    ConstructionFailed {
        target: String,
        #[source]
        source: BoxError,
    },

    #[error("Service '{key}' does not hold a value of type {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("Service '{key}' depends on itself through its constructor")]
    CircularService { key: String },

    #[error("Object factory lock failure: {message}")]
    Lock { message: String },
}

impl crate::core::error_handling::ContextualError for FactoryError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}
