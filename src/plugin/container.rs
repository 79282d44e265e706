//! Object factory
//!
//! The plugin manager does not build plugins itself; it asks an
//! [`ObjectFactory`] to construct them by identity, and hands the same factory
//! to service-aware plugins so they can contribute bindings. [`Container`] is
//! the in-process implementation: plugin descriptors plus lazily-constructed
//! singleton services.

use crate::core::error_handling::BoxError;
use crate::core::sync::{handle_rwlock_read, handle_rwlock_write, recover_mutex};
use crate::plugin::descriptor::{discover_plugins, PluginDescriptor};
use crate::plugin::error::{FactoryError, FactoryResult};
use crate::plugin::traits::Plugin;
use crate::plugin::types::PluginId;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

pub type ServiceConstructor =
    Arc<dyn Fn(&dyn ObjectFactory) -> Result<ServiceInstance, BoxError> + Send + Sync>;

/// Construction capability consumed by the plugin manager
pub trait ObjectFactory: Send + Sync {
    /// Descriptor for `id`, or `None` if `id` is not a plugin type
    fn describe(&self, id: &PluginId) -> Option<PluginDescriptor>;

    /// Build a new instance of the plugin `id`, resolving its constructor dependencies
    fn construct(&self, id: &PluginId) -> FactoryResult<Arc<dyn Plugin>>;

    /// Register (or replace) the constructor for service `key`
    fn bind(&self, key: &str, constructor: ServiceConstructor) -> FactoryResult<()>;

    /// Shared instance of service `key`, constructing it on first use
    fn resolve(&self, key: &str) -> FactoryResult<ServiceInstance>;

    fn has_binding(&self, key: &str) -> bool;
}

/// Typed access to service bindings, keyed by the service's type name
pub trait ObjectFactoryExt {
    fn bind_service<T, F>(&self, constructor: F) -> FactoryResult<()>
    where
        T: Any + Send + Sync,
        F: Fn(&dyn ObjectFactory) -> Result<T, BoxError> + Send + Sync + 'static;

    fn service<T: Any + Send + Sync>(&self) -> FactoryResult<Arc<T>>;
}

impl<O: ObjectFactory + ?Sized> ObjectFactoryExt for O {
    fn bind_service<T, F>(&self, constructor: F) -> FactoryResult<()>
    where
        T: Any + Send + Sync,
        F: Fn(&dyn ObjectFactory) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let constructor: ServiceConstructor = Arc::new(move |factory: &dyn ObjectFactory| {
            let instance: ServiceInstance = Arc::new(constructor(factory)?);
            Ok(instance)
        });
        self.bind(std::any::type_name::<T>(), constructor)
    }

    fn service<T: Any + Send + Sync>(&self) -> FactoryResult<Arc<T>> {
        let key = std::any::type_name::<T>();
        self.resolve(key)?
            .downcast::<T>()
            .map_err(|_| FactoryError::TypeMismatch {
                key: key.to_string(),
                expected: key,
            })
    }
}

struct ServiceBinding {
    constructor: ServiceConstructor,
    instance: Option<ServiceInstance>,
}

/// In-process object factory
pub struct Container {
    plugins: RwLock<HashMap<PluginId, PluginDescriptor>>,
    services: RwLock<HashMap<String, ServiceBinding>>,
    resolving: Mutex<HashSet<String>>,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plugins: Vec<String> = self
            .plugins
            .read()
            .map(|plugins| plugins.keys().map(ToString::to_string).collect())
            .unwrap_or_default();
        let services: Vec<String> = self
            .services
            .read()
            .map(|services| services.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("Container")
            .field("plugins", &plugins)
            .field("services", &services)
            .finish()
    }
}

impl Container {
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(HashMap::new()),
            services: RwLock::new(HashMap::new()),
            resolving: Mutex::new(HashSet::new()),
        }
    }

    /// Container pre-populated with every plugin submitted via `submit_plugin!`
    pub fn with_discovered_plugins() -> FactoryResult<Self> {
        let container = Self::new();
        for descriptor in discover_plugins() {
            container.provide(descriptor)?;
        }
        Ok(container)
    }

    /// Make a plugin type constructible; replaces an earlier descriptor with the same identity
    pub fn provide(&self, descriptor: PluginDescriptor) -> FactoryResult<()> {
        let mut plugins = handle_rwlock_write(self.plugins.write(), lock_error)?;
        if plugins.contains_key(descriptor.id()) {
            log::warn!(
                "Container: descriptor for plugin '{}' replaced",
                descriptor.id()
            );
        }
        plugins.insert(descriptor.id().clone(), descriptor);
        Ok(())
    }

    fn cached_service(&self, key: &str) -> FactoryResult<(Option<ServiceInstance>, ServiceConstructor)> {
        let services = handle_rwlock_read(self.services.read(), lock_error)?;
        let binding = services
            .get(key)
            .ok_or_else(|| FactoryError::UnknownService {
                key: key.to_string(),
            })?;
        Ok((binding.instance.clone(), binding.constructor.clone()))
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectFactory for Container {
    fn describe(&self, id: &PluginId) -> Option<PluginDescriptor> {
        self.plugins
            .read()
            .ok()
            .and_then(|plugins| plugins.get(id).cloned())
    }

    fn construct(&self, id: &PluginId) -> FactoryResult<Arc<dyn Plugin>> {
        let descriptor = self
            .describe(id)
            .ok_or_else(|| FactoryError::UnknownPlugin {
                plugin_id: id.clone(),
            })?;

        // No lock held here: constructors resolve services through `self`
        descriptor
            .construct(self)
            .map_err(|source| FactoryError::ConstructionFailed {
                target: id.to_string(),
                source,
            })
    }

    fn bind(&self, key: &str, constructor: ServiceConstructor) -> FactoryResult<()> {
        let mut services = handle_rwlock_write(self.services.write(), lock_error)?;
        log::trace!("Container: binding service '{}'", key);
        services.insert(
            key.to_string(),
            ServiceBinding {
                constructor,
                instance: None,
            },
        );
        Ok(())
    }

    fn resolve(&self, key: &str) -> FactoryResult<ServiceInstance> {
        let (cached, constructor) = self.cached_service(key)?;
        if let Some(instance) = cached {
            return Ok(instance);
        }

        if !recover_mutex(self.resolving.lock()).insert(key.to_string()) {
            return Err(FactoryError::CircularService {
                key: key.to_string(),
            });
        }
        let constructed = constructor(self);
        recover_mutex(self.resolving.lock()).remove(key);

        let instance = constructed.map_err(|source| FactoryError::ConstructionFailed {
            target: key.to_string(),
            source,
        })?;

        let mut services = handle_rwlock_write(self.services.write(), lock_error)?;
        match services.get_mut(key) {
            Some(binding) => Ok(binding.instance.get_or_insert(instance).clone()),
            None => Err(FactoryError::UnknownService {
                key: key.to_string(),
            }),
        }
    }

    fn has_binding(&self, key: &str) -> bool {
        self.services
            .read()
            .map(|services| services.contains_key(key))
            .unwrap_or(false)
    }
}

fn lock_error(message: String) -> FactoryError {
    FactoryError::Lock { message }
}
