//! Plugin Trait System
//!
//! A plugin is any `Send + Sync` type implementing [`Plugin`]. Everything else
//! is optional: a plugin opts into a phase by implementing the matching hook
//! trait and returning itself from the corresponding `as_*` accessor.
//!
//! # Phase order
//!
//! For every plugin the manager runs, in this order:
//!
//! 1. load all [`Dependent`] dependencies (recursively, each exactly once)
//! 2. construct the instance through the object factory
//! 3. [`ServiceAware::wire_object_graph`]
//! 4. [`EventAware::register_event_listeners`]
//! 5. custom load handlers, in registration order
//! 6. [`Bootable::boot`]
//!
//! Hooks take `&self`; plugins that keep state across hooks use interior
//! mutability.

use crate::core::error_handling::BoxError;
use crate::events::api::EventEmitter;
use crate::plugin::container::ObjectFactory;
use crate::plugin::types::PluginId;

/// Base plugin trait that all plugins must implement
pub trait Plugin: Send + Sync {
    /// Returns this plugin as a ServiceAware if it implements that trait
    fn as_service_aware(&self) -> Option<&dyn ServiceAware> {
        None
    }

    /// Returns this plugin as an EventAware if it implements that trait
    fn as_event_aware(&self) -> Option<&dyn EventAware> {
        None
    }

    /// Returns this plugin as a Bootable if it implements that trait
    fn as_bootable(&self) -> Option<&dyn Bootable> {
        None
    }

    /// Marker interfaces this plugin implements
    ///
    /// Custom handlers registered against `Capability::Interface(name)` run for
    /// every plugin listing `name` here.
    fn interfaces(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Plugins that need other plugins loaded before them
///
/// Declared on the type rather than the instance: dependencies are resolved
/// before the dependent is constructed. Hook it up with
/// [`PluginDescriptor::with_dependency_fn`](crate::plugin::descriptor::PluginDescriptor::with_dependency_fn)
/// or [`PluginDescriptor::dependent`](crate::plugin::descriptor::PluginDescriptor::dependent).
pub trait Dependent {
    fn depends_on() -> Vec<PluginId>;
}

/// Plugins that contribute bindings to the object factory
///
/// Runs before any other phase of the same plugin, so plugins loaded later
/// can resolve these bindings in their constructors.
pub trait ServiceAware: Send + Sync {
    fn wire_object_graph(&self, factory: &dyn ObjectFactory) -> Result<(), BoxError>;
}

/// Plugins that listen on the engine's event emitter
pub trait EventAware: Send + Sync {
    fn register_event_listeners(&self, emitter: &EventEmitter) -> Result<(), BoxError>;

    /// Called when a loaded plugin is removed; should undo
    /// [`register_event_listeners`](Self::register_event_listeners)
    fn remove_event_listeners(&self, emitter: &EventEmitter) -> Result<(), BoxError>;
}

/// Plugins with startup logic; runs after every other phase
#[async_trait::async_trait]
pub trait Bootable: Send + Sync {
    async fn boot(&self) -> Result<(), BoxError>;
}
