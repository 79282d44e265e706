//! Type definitions for the plugin system
//!
//! Identities, capabilities, lifecycle phases and handler keys shared by the
//! registry, the manager and the handler tables.

use std::fmt;

/// Stable identity of a plugin type
///
/// Usually derived from the Rust type via [`PluginId::of`], but any unique
/// string works; the object factory is what gives an identity meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(String);

impl PluginId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity of the plugin type `P`
    pub fn of<P: ?Sized + 'static>() -> Self {
        Self(std::any::type_name::<P>().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PluginId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PluginId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Optional contract a plugin may fulfil
///
/// The four built-in capabilities correspond to the hook traits; `Interface`
/// names a marker interface declared by the plugin itself so custom handlers
/// can target a family of plugins.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    Dependent,
    ServiceAware,
    EventAware,
    Bootable,
    Interface(String),
}

impl Capability {
    pub fn interface(name: impl Into<String>) -> Self {
        Capability::Interface(name.into())
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Dependent => write!(f, "Dependent"),
            Capability::ServiceAware => write!(f, "ServiceAware"),
            Capability::EventAware => write!(f, "EventAware"),
            Capability::Bootable => write!(f, "Bootable"),
            Capability::Interface(name) => write!(f, "Interface({})", name),
        }
    }
}

/// Lifecycle phase of a registered plugin
///
/// A plugin that is not in the registry at all has no phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PluginPhase {
    Registered,
    Loading,
    Loaded,
}

/// What a custom handler is bound to: one plugin identity, or every plugin
/// with a given capability
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HandlerKey {
    Plugin(PluginId),
    Capability(Capability),
}

impl From<PluginId> for HandlerKey {
    fn from(id: PluginId) -> Self {
        HandlerKey::Plugin(id)
    }
}

impl From<Capability> for HandlerKey {
    fn from(capability: Capability) -> Self {
        HandlerKey::Capability(capability)
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKey::Plugin(id) => write!(f, "plugin '{}'", id),
            HandlerKey::Capability(capability) => write!(f, "capability {}", capability),
        }
    }
}

/// Which hook of a plugin (or which custom handler) raised an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PluginHook {
    WireObjectGraph,
    RegisterEventListeners,
    RemoveEventListeners,
    LoadHandler,
    RemoveHandler,
    Boot,
}
