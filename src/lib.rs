//! Plugin lifecycle manager and run-loop engine
//!
//! [`plugin`] registers plugins, loads them in dependency order through an
//! object factory and tears them down again. [`engine`] drives a host
//! application through plugin loading, start and shutdown, with a single
//! recovery point for failures and interrupts. [`events`] carries the bootup,
//! shutdown and custom events between them.

pub mod core;
pub mod engine;
pub mod events;
pub mod plugin;

#[doc(hidden)]
pub use inventory;
