//! Public API for the engine

pub use crate::engine::application::Application;
pub use crate::engine::error::{EngineError, EngineResult};
pub use crate::engine::run_loop::{Engine, SHUTDOWN_CRASHED, SHUTDOWN_INTERRUPTED};
pub use crate::engine::state::{AppOperation, EngineState};

// Interrupt line shared with hosts
pub use crate::core::shutdown::InterruptHandle;
