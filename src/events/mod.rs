//! Event emission for the engine and its plugins
//!
//! Listeners are async callbacks keyed by [`EventKind`](api::EventKind). The
//! engine reserves the bootup and shutdown kinds; everything else is free for
//! plugins and hosts.

// Internal modules - all access should go through api module
pub(crate) mod emitter;
pub(crate) mod error;
pub(crate) mod event;

// Public API module - the only public interface for the event system
pub mod api;
