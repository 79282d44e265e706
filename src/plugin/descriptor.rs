//! Plugin descriptors
//!
//! A descriptor is what the object factory knows about a plugin type before
//! any instance exists: its identity, how to construct it, and which plugins
//! it depends on. Descriptors can be handed to a [`Container`] directly or
//! submitted at compile time with [`submit_plugin!`](crate::submit_plugin).
//!
//! [`Container`]: crate::plugin::container::Container

use crate::core::error_handling::BoxError;
use crate::plugin::container::ObjectFactory;
use crate::plugin::traits::{Dependent, Plugin};
use crate::plugin::types::PluginId;
use std::sync::Arc;

type PluginConstructor =
    Arc<dyn Fn(&dyn ObjectFactory) -> Result<Arc<dyn Plugin>, BoxError> + Send + Sync>;

type DependencyFn = Arc<dyn Fn() -> Vec<PluginId> + Send + Sync>;

#[derive(Clone)]
pub struct PluginDescriptor {
    id: PluginId,
    constructor: PluginConstructor,
    dependencies: Option<DependencyFn>,
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("id", &self.id)
            .field("dependent", &self.is_dependent())
            .finish()
    }
}

impl PluginDescriptor {
    /// Describe a plugin under an explicit identity
    pub fn new<F>(id: impl Into<PluginId>, constructor: F) -> Self
    where
        F: Fn(&dyn ObjectFactory) -> Result<Arc<dyn Plugin>, BoxError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            constructor: Arc::new(constructor),
            dependencies: None,
        }
    }

    /// Describe the plugin type `P` under `PluginId::of::<P>()`
    ///
    /// The constructor receives the factory so it can resolve the services
    /// `P` needs.
    pub fn of<P, F>(constructor: F) -> Self
    where
        P: Plugin + 'static,
        F: Fn(&dyn ObjectFactory) -> Result<P, BoxError> + Send + Sync + 'static,
    {
        Self::new(PluginId::of::<P>(), move |factory| {
            let plugin: Arc<dyn Plugin> = Arc::new(constructor(factory)?);
            Ok(plugin)
        })
    }

    /// Describe a plugin type without constructor dependencies
    pub fn of_default<P>() -> Self
    where
        P: Plugin + Default + 'static,
    {
        Self::of::<P, _>(|_| Ok(P::default()))
    }

    /// Describe a default-constructible [`Dependent`] plugin type
    pub fn dependent<P>() -> Self
    where
        P: Plugin + Dependent + Default + 'static,
    {
        Self::of_default::<P>().with_dependency_fn(P::depends_on)
    }

    /// Declare a fixed list of dependencies
    pub fn with_dependencies(self, dependencies: Vec<PluginId>) -> Self {
        self.with_dependency_fn(move || dependencies.clone())
    }

    /// Declare dependencies through a function, re-evaluated on every load
    pub fn with_dependency_fn<F>(mut self, dependencies: F) -> Self
    where
        F: Fn() -> Vec<PluginId> + Send + Sync + 'static,
    {
        self.dependencies = Some(Arc::new(dependencies));
        self
    }

    pub fn id(&self) -> &PluginId {
        &self.id
    }

    pub fn is_dependent(&self) -> bool {
        self.dependencies.is_some()
    }

    /// Current dependency list; empty for non-dependent plugins
    pub fn dependencies(&self) -> Vec<PluginId> {
        self.dependencies
            .as_ref()
            .map(|dependencies| dependencies())
            .unwrap_or_default()
    }

    pub(crate) fn construct(&self, factory: &dyn ObjectFactory) -> Result<Arc<dyn Plugin>, BoxError> {
        (self.constructor)(factory)
    }
}

/// Compile-time plugin registration collected with `inventory`
pub struct PluginRegistration {
    pub describe: fn() -> PluginDescriptor,
}

inventory::collect!(PluginRegistration);

/// Register a plugin descriptor for discovery by
/// [`Container::with_discovered_plugins`](crate::plugin::container::Container::with_discovered_plugins)
///
/// ```ignore
/// plugin_engine::submit_plugin!(|| PluginDescriptor::of_default::<AuditPlugin>());
/// ```
#[macro_export]
macro_rules! submit_plugin {
    ($describe:expr) => {
        $crate::inventory::submit! {
            $crate::plugin::api::PluginRegistration {
                describe: $describe,
            }
        }
    };
}

/// Descriptors of every plugin submitted with `submit_plugin!`
pub fn discover_plugins() -> Vec<PluginDescriptor> {
    inventory::iter::<PluginRegistration>()
        .map(|registration| (registration.describe)())
        .collect()
}
