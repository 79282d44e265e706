//! Generic error handling utilities
//!
//! Lets the engine's recovery point log any error of the crate with the right
//! level of detail, without knowing which subsystem raised it.

/// Error type returned by plugin hooks, custom handlers, listeners and the
/// host application
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for errors that can distinguish between caller mistakes and runtime failures
///
/// Caller mistakes (registering the same plugin twice, running a busy engine)
/// carry a message that is meaningful on its own. Runtime failures (a plugin
/// hook returning an error, a listener failing) are logged with generic
/// context and full detail at debug level.
///
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)`; otherwise it should return `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a message the caller can act on directly
    fn is_user_actionable(&self) -> bool;

    /// Returns the specific message if this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// Log errors with appropriate detail level based on error specificity
///
/// User-actionable errors log their own message; everything else logs
/// `operation_context`. The full error and its source chain always go to
/// debug level.
pub fn log_error_with_context<E: ContextualError + ?Sized>(error: &E, operation_context: &str) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => {
            log::error!("{}: {}", operation_context, user_msg)
        }
        _ => log::error!("{}", operation_context),
    }

    log::debug!("DETAIL: {}", error);
    let mut source = error.source();
    while let Some(cause) = source {
        log::debug!("CAUSED BY: {}", cause);
        source = cause.source();
    }
}
