//! Host application contract

use crate::core::error_handling::BoxError;
use crate::engine::error::EngineError;

/// The embedding host, driven by [`Engine::run`](crate::engine::api::Engine::run)
///
/// `load_plugins` usually registers the host's plugins and loads them through
/// the engine's plugin manager. `start` is the body of the run: the run ends
/// when it returns.
#[async_trait::async_trait]
pub trait Application: Send + Sync {
    async fn load_plugins(&self) -> Result<(), BoxError>;

    async fn start(&self) -> Result<(), BoxError>;

    /// Called only when the run is interrupted
    async fn stop(&self) -> Result<(), BoxError>;

    /// Receives the failure that crashed the run
    ///
    /// An error returned (or a panic raised) here is logged and otherwise ignored.
    fn handle_exception(&self, error: &EngineError) -> Result<(), BoxError>;
}
