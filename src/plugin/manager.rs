//! Plugin Manager
//!
//! Owns the registry, the transient `loading` set and both handler tables, and
//! drives every plugin through its phases. Plugins are constructed through the
//! object factory; the manager never builds instances itself.
//!
//! Loading is recursive over declared dependencies. A plugin's dependencies
//! finish all of their phases before the plugin itself is constructed, and a
//! plugin reachable from several dependents is loaded exactly once.

use crate::core::error_handling::BoxError;
use crate::events::api::EventEmitter;
use crate::plugin::container::ObjectFactory;
use crate::plugin::descriptor::PluginDescriptor;
use crate::plugin::error::{FactoryError, PluginError, PluginResult};
use crate::plugin::handlers::{HandlerArgs, HandlerTable, LoadHandler, RemoveHandler};
use crate::plugin::registry::PluginRegistry;
use crate::plugin::traits::Plugin;
use crate::plugin::types::{Capability, HandlerKey, PluginHook, PluginId, PluginPhase};
use futures::future::{BoxFuture, FutureExt};
use log::{debug, info, trace, warn};
use std::collections::HashSet;
use std::sync::Arc;

pub struct PluginManager {
    /// Registered plugins (owned by this manager)
    registry: PluginRegistry,

    /// Plugins whose `load_one` is in progress; empty between loads
    loading: HashSet<PluginId>,

    /// Set once `load_plugins` has completed successfully
    loaded: bool,

    load_handlers: HandlerTable<LoadHandler>,
    remove_handlers: HandlerTable<RemoveHandler>,

    factory: Arc<dyn ObjectFactory>,
    emitter: Arc<EventEmitter>,
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("registry", &self.registry)
            .field("loading", &self.loading)
            .field("loaded", &self.loaded)
            .field("load_handlers", &self.load_handlers.len())
            .field("remove_handlers", &self.remove_handlers.len())
            .finish()
    }
}

impl PluginManager {
    pub fn new(factory: Arc<dyn ObjectFactory>, emitter: Arc<EventEmitter>) -> Self {
        Self {
            registry: PluginRegistry::new(),
            loading: HashSet::new(),
            loaded: false,
            load_handlers: HandlerTable::new(),
            remove_handlers: HandlerTable::new(),
            factory,
            emitter,
        }
    }

    /// Register a plugin identity for the next `load_plugins`
    ///
    /// Nothing is constructed yet. Fails with `InvalidArgument` for a
    /// duplicate or an identity the object factory does not know as a plugin,
    /// and with `InvalidState` once loading has completed.
    pub fn register_plugin(&mut self, id: PluginId) -> PluginResult<()> {
        if self.registry.contains(&id) {
            return Err(PluginError::invalid_argument(format!(
                "Plugin '{}' is already registered",
                id
            )));
        }

        if self.loaded {
            return Err(PluginError::invalid_state(format!(
                "Cannot register plugin '{}': plugins have already been loaded",
                id
            )));
        }

        let descriptor = self.factory.describe(&id).ok_or_else(|| {
            PluginError::invalid_argument(format!("'{}' is not a plugin type", id))
        })?;

        debug!("PluginManager: registered plugin '{}'", id);
        self.registry.insert(descriptor)
    }

    /// Register a load handler for every plugin matching `key`
    pub fn on_plugin_load(&mut self, key: HandlerKey, handler: LoadHandler, extra_args: HandlerArgs) {
        trace!("PluginManager: load handler registered for {}", key);
        self.load_handlers.register(key, handler, extra_args);
    }

    /// Register a remove handler for every plugin matching `key`
    pub fn on_plugin_remove(
        &mut self,
        key: HandlerKey,
        handler: RemoveHandler,
        extra_args: HandlerArgs,
    ) {
        trace!("PluginManager: remove handler registered for {}", key);
        self.remove_handlers.register(key, handler, extra_args);
    }

    /// Load every registered plugin, in registration order
    ///
    /// Plugins already loaded by an earlier call are skipped, so calling this
    /// again only loads what was registered since. On failure every plugin
    /// still mid-load returns to `Registered` and the error is returned as is.
    ///
    /// If an earlier call was dropped before finishing, its half-loaded
    /// plugins are torn down first and loaded again from scratch.
    pub async fn load_plugins(&mut self) -> PluginResult<()> {
        if !self.loading.is_empty() {
            self.recover_cancelled_load();
        }

        if self.registry.is_empty() {
            debug!("PluginManager: no plugins registered");
            self.loaded = true;
            return Ok(());
        }

        info!("PluginManager: loading {} plugins", self.registry.len());
        for id in self.registry.ids() {
            if let Err(error) = self.load_one(id, None).await {
                self.abandon_loading();
                return Err(error);
            }
        }

        self.loaded = true;
        info!("PluginManager: all plugins loaded");
        Ok(())
    }

    fn load_one(&mut self, id: PluginId, dependent: Option<PluginId>) -> BoxFuture<'_, PluginResult<()>> {
        async move {
            let record = self
                .registry
                .get_mut(&id)
                .ok_or_else(|| PluginError::NotFound {
                    plugin_id: id.clone(),
                })?;

            if record.phase == PluginPhase::Loaded {
                return Ok(());
            }

            if self.loading.contains(&id) {
                return Err(PluginError::CircularDependency {
                    dependent: dependent.unwrap_or_else(|| id.clone()),
                    dependency: id,
                });
            }

            record.phase = PluginPhase::Loading;
            let descriptor = record.descriptor.clone();
            self.loading.insert(id.clone());
            trace!("PluginManager: loading '{}'", id);

            for dependency in descriptor.dependencies() {
                if !self.registry.contains(&dependency) {
                    let dependency_descriptor =
                        self.factory.describe(&dependency).ok_or_else(|| {
                            PluginError::invalid_state(format!(
                                "Dependency '{}' of plugin '{}' is not a plugin type",
                                dependency, id
                            ))
                        })?;
                    debug!(
                        "PluginManager: registering '{}' as a dependency of '{}'",
                        dependency, id
                    );
                    self.registry.insert(dependency_descriptor)?;
                }
                self.load_one(dependency, Some(id.clone())).await?;
            }

            let instance = self.factory.construct(&id).map_err(|source| {
                PluginError::DependencyInjection {
                    plugin_id: id.clone(),
                    source: Box::new(source),
                }
            })?;
            let capabilities = capabilities_of(&descriptor, instance.as_ref());
            if let Some(record) = self.registry.get_mut(&id) {
                record.instance = Some(instance.clone());
                record.capabilities = capabilities.clone();
            }

            if let Some(service_aware) = instance.as_service_aware() {
                service_aware
                    .wire_object_graph(self.factory.as_ref())
                    .map_err(|source| wiring_error(&id, source))?;
            }

            if let Some(event_aware) = instance.as_event_aware() {
                event_aware
                    .register_event_listeners(&self.emitter)
                    .map_err(|source| hook_error(&id, PluginHook::RegisterEventListeners, source))?;
            }

            for entry in self.load_handlers.matching(&id, &capabilities) {
                entry
                    .handler
                    .invoke(instance.clone(), entry.extra_args)
                    .await
                    .map_err(|source| hook_error(&id, PluginHook::LoadHandler, source))?;
            }

            if let Some(bootable) = instance.as_bootable() {
                bootable
                    .boot()
                    .await
                    .map_err(|source| hook_error(&id, PluginHook::Boot, source))?;
            }

            self.loading.remove(&id);
            if let Some(record) = self.registry.get_mut(&id) {
                record.phase = PluginPhase::Loaded;
            }
            debug!("PluginManager: plugin '{}' loaded", id);
            Ok(())
        }
        .boxed()
    }

    /// Return every plugin that was mid-load to `Registered`
    fn abandon_loading(&mut self) {
        for id in self.loading.drain() {
            if let Some(record) = self.registry.get_mut(&id) {
                warn!("PluginManager: loading of '{}' abandoned", id);
                record.reset();
            }
        }
    }

    /// Tear down what a dropped `load_plugins` left behind
    ///
    /// A load can only be dropped while suspended in a load handler or in
    /// `boot`, so every constructed instance still in `loading` has already
    /// registered its event listeners.
    fn recover_cancelled_load(&mut self) {
        warn!(
            "PluginManager: previous load was interrupted with {} plugins mid-load",
            self.loading.len()
        );
        for id in &self.loading {
            let Some(instance) = self.registry.get(id).and_then(|record| record.instance.clone())
            else {
                continue;
            };
            if let Some(event_aware) = instance.as_event_aware() {
                if let Err(error) = event_aware.remove_event_listeners(&self.emitter) {
                    warn!(
                        "PluginManager: removing listeners of '{}' failed: {}",
                        id, error
                    );
                }
            }
        }
        self.abandon_loading();
    }

    /// Remove a plugin from the registry
    ///
    /// A loaded plugin first has its event listeners removed and then every
    /// matching remove handler run. If any of those fails the record is kept
    /// and the error returned. Unknown identities are ignored.
    pub fn remove_plugin(&mut self, id: &PluginId) -> PluginResult<()> {
        let Some(record) = self.registry.get(id) else {
            trace!("PluginManager: '{}' is not registered, nothing to remove", id);
            return Ok(());
        };

        if record.phase == PluginPhase::Loaded {
            if let Some(instance) = record.instance.clone() {
                let capabilities = record.capabilities.clone();

                if let Some(event_aware) = instance.as_event_aware() {
                    event_aware
                        .remove_event_listeners(&self.emitter)
                        .map_err(|source| hook_error(id, PluginHook::RemoveEventListeners, source))?;
                }

                for entry in self.remove_handlers.matching(id, &capabilities) {
                    entry
                        .handler
                        .invoke(&instance, &entry.extra_args)
                        .map_err(|source| hook_error(id, PluginHook::RemoveHandler, source))?;
                }
            }
        }

        self.registry.remove(id);
        debug!("PluginManager: plugin '{}' removed", id);
        Ok(())
    }

    pub fn has_plugin_been_registered(&self, id: &PluginId) -> bool {
        self.registry.contains(id)
    }

    pub fn have_plugins_loaded(&self) -> bool {
        self.loaded
    }

    pub fn plugin_phase(&self, id: &PluginId) -> Option<PluginPhase> {
        self.registry.get(id).map(|record| record.phase)
    }

    pub fn get_loaded_plugin(&self, id: &PluginId) -> PluginResult<Arc<dyn Plugin>> {
        let record = self.registry.get(id).ok_or_else(|| PluginError::NotFound {
            plugin_id: id.clone(),
        })?;

        if !self.loaded || record.phase != PluginPhase::Loaded {
            return Err(PluginError::invalid_state(format!(
                "Plugin '{}' has not been loaded yet",
                id
            )));
        }

        record
            .instance
            .clone()
            .ok_or_else(|| PluginError::invalid_state(format!("Plugin '{}' has no instance", id)))
    }

    /// Every loaded plugin in registration order
    pub fn get_loaded_plugins(&self) -> PluginResult<Vec<(PluginId, Arc<dyn Plugin>)>> {
        if !self.loaded {
            return Err(PluginError::invalid_state("Plugins have not been loaded yet"));
        }

        Ok(self
            .registry
            .records()
            .filter(|record| record.phase == PluginPhase::Loaded)
            .filter_map(|record| {
                record
                    .instance
                    .clone()
                    .map(|instance| (record.id.clone(), instance))
            })
            .collect())
    }

    /// Every registered identity, including implicitly registered dependencies
    pub fn get_registered_plugins(&self) -> Vec<PluginId> {
        self.registry.ids()
    }
}

fn capabilities_of(descriptor: &PluginDescriptor, instance: &dyn Plugin) -> HashSet<Capability> {
    let mut capabilities = HashSet::new();
    if descriptor.is_dependent() {
        capabilities.insert(Capability::Dependent);
    }
    if instance.as_service_aware().is_some() {
        capabilities.insert(Capability::ServiceAware);
    }
    if instance.as_event_aware().is_some() {
        capabilities.insert(Capability::EventAware);
    }
    if instance.as_bootable().is_some() {
        capabilities.insert(Capability::Bootable);
    }
    capabilities.extend(instance.interfaces().into_iter().map(Capability::Interface));
    capabilities
}

fn hook_error(id: &PluginId, hook: PluginHook, source: BoxError) -> PluginError {
    PluginError::Hook {
        plugin_id: id.clone(),
        hook,
        source,
    }
}

/// Factory failures while wiring are injection errors; anything else is a hook failure
fn wiring_error(id: &PluginId, source: BoxError) -> PluginError {
    if source.downcast_ref::<FactoryError>().is_some() {
        PluginError::DependencyInjection {
            plugin_id: id.clone(),
            source,
        }
    } else {
        hook_error(id, PluginHook::WireObjectGraph, source)
    }
}
