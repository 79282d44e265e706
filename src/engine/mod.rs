//! Run-loop engine
//!
//! Sequences plugin loading with the host application's start/stop lifecycle
//! and owns the single recovery point for failed runs.

pub(crate) mod application;
pub(crate) mod error;
pub(crate) mod run_loop;
pub(crate) mod state;

pub mod api;
