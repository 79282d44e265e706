//! Plugin System Module
//!
//! Registration, dependency-ordered loading, phased initialization and removal
//! of plugins constructed through an object factory.

// Internal modules - all access should go through api module
pub(crate) mod container;
pub(crate) mod descriptor;
pub(crate) mod error;
pub(crate) mod handlers;
pub(crate) mod manager;
pub(crate) mod pluggable;
pub(crate) mod registry;
pub(crate) mod traits;
pub(crate) mod types;

// Public API module - the only public interface for the plugin system
pub mod api;

#[cfg(test)]
mod tests;
