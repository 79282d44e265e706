//! Shared plugin manager
//!
//! The engine, the host application and plugin-facing code all need the same
//! manager. [`SharedPluginManager`] wraps it in an async mutex and exposes the
//! [`Pluggable`] surface; every call takes the lock for its whole duration.
//!
//! Hooks and handlers run while `load_plugins` or `remove_plugin` holds the
//! lock, so calling back into the shared manager from inside one of them
//! never completes.

use crate::events::api::EventEmitter;
use crate::plugin::container::ObjectFactory;
use crate::plugin::error::PluginResult;
use crate::plugin::handlers::{HandlerArgs, LoadHandler, RemoveHandler};
use crate::plugin::manager::PluginManager;
use crate::plugin::traits::Plugin;
use crate::plugin::types::{HandlerKey, PluginId, PluginPhase};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Registration, removal, loading and query surface exposed to hosts
#[async_trait::async_trait]
pub trait Pluggable: Send + Sync {
    async fn register_plugin(&self, id: PluginId) -> PluginResult<()>;

    async fn load_plugins(&self) -> PluginResult<()>;

    async fn remove_plugin(&self, id: &PluginId) -> PluginResult<()>;

    async fn on_plugin_load(&self, key: HandlerKey, handler: LoadHandler, extra_args: HandlerArgs);

    async fn on_plugin_remove(&self, key: HandlerKey, handler: RemoveHandler, extra_args: HandlerArgs);

    async fn has_plugin_been_registered(&self, id: &PluginId) -> bool;

    async fn have_plugins_loaded(&self) -> bool;

    async fn get_loaded_plugin(&self, id: &PluginId) -> PluginResult<Arc<dyn Plugin>>;

    async fn get_loaded_plugins(&self) -> PluginResult<Vec<(PluginId, Arc<dyn Plugin>)>>;

    async fn get_registered_plugins(&self) -> Vec<PluginId>;

    async fn plugin_phase(&self, id: &PluginId) -> Option<PluginPhase>;
}

/// Thread-safe wrapper around the plugin manager
#[derive(Clone, Debug)]
pub struct SharedPluginManager {
    inner: Arc<Mutex<PluginManager>>,
}

impl SharedPluginManager {
    pub fn new(factory: Arc<dyn ObjectFactory>, emitter: Arc<EventEmitter>) -> Self {
        Self::from_manager(PluginManager::new(factory, emitter))
    }

    pub fn from_manager(manager: PluginManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

}

#[async_trait::async_trait]
impl Pluggable for SharedPluginManager {
    async fn register_plugin(&self, id: PluginId) -> PluginResult<()> {
        self.inner.lock().await.register_plugin(id)
    }

    async fn load_plugins(&self) -> PluginResult<()> {
        self.inner.lock().await.load_plugins().await
    }

    async fn remove_plugin(&self, id: &PluginId) -> PluginResult<()> {
        self.inner.lock().await.remove_plugin(id)
    }

    async fn on_plugin_load(&self, key: HandlerKey, handler: LoadHandler, extra_args: HandlerArgs) {
        self.inner
            .lock()
            .await
            .on_plugin_load(key, handler, extra_args);
    }

    async fn on_plugin_remove(&self, key: HandlerKey, handler: RemoveHandler, extra_args: HandlerArgs) {
        self.inner
            .lock()
            .await
            .on_plugin_remove(key, handler, extra_args);
    }

    async fn has_plugin_been_registered(&self, id: &PluginId) -> bool {
        self.inner.lock().await.has_plugin_been_registered(id)
    }

    async fn have_plugins_loaded(&self) -> bool {
        self.inner.lock().await.have_plugins_loaded()
    }

    async fn get_loaded_plugin(&self, id: &PluginId) -> PluginResult<Arc<dyn Plugin>> {
        self.inner.lock().await.get_loaded_plugin(id)
    }

    async fn get_loaded_plugins(&self) -> PluginResult<Vec<(PluginId, Arc<dyn Plugin>)>> {
        self.inner.lock().await.get_loaded_plugins()
    }

    async fn get_registered_plugins(&self) -> Vec<PluginId> {
        self.inner.lock().await.get_registered_plugins()
    }

    async fn plugin_phase(&self, id: &PluginId) -> Option<PluginPhase> {
        self.inner.lock().await.plugin_phase(id)
    }
}
