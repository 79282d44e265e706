//! Test modules for the plugin system
//!
//! Loading, removal and query suites for the plugin manager, sharing the
//! recording plugin from `utils`.

mod utils;
