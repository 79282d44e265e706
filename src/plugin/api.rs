//! Public API for the plugin system
//!
//! External modules should import from here rather than directly from internal modules.

// Core plugin management
pub use crate::plugin::manager::PluginManager;
pub use crate::plugin::pluggable::{Pluggable, SharedPluginManager};

// Error handling
pub use crate::plugin::error::{FactoryError, FactoryResult, PluginError, PluginResult};

// Plugin traits and identities
pub use crate::plugin::traits::{Bootable, Dependent, EventAware, Plugin, ServiceAware};
pub use crate::plugin::types::{Capability, HandlerKey, PluginHook, PluginId, PluginPhase};

// Object factory and plugin descriptors
pub use crate::plugin::container::{
    Container, ObjectFactory, ObjectFactoryExt, ServiceConstructor, ServiceInstance,
};
pub use crate::plugin::descriptor::{discover_plugins, PluginDescriptor, PluginRegistration};

// Custom handlers
pub use crate::plugin::handlers::{HandlerArgs, LoadHandler, RemoveHandler};

// Plugin registry
pub use crate::plugin::registry::{PluginRecord, PluginRegistry};
