//! Engine states and application operations

/// Lifecycle state of an [`Engine`](crate::engine::api::Engine)
///
/// Only `Idle` accepts `run()`. `Crashed` is terminal: a crashed engine
/// rejects further runs the same way a running one does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum_macros::Display)]
pub enum EngineState {
    #[default]
    Idle,
    Running,
    Crashed,
}

/// Application callback the engine was awaiting when a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AppOperation {
    LoadPlugins,
    Start,
    Stop,
}
