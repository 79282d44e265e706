//! Custom load and remove handlers
//!
//! Handlers are registered against a [`HandlerKey`] and run for every plugin
//! that matches it: the plugin with that identity, or every plugin with that
//! capability. Keys are visited in the order they were first registered and
//! handlers under a key in the order they were added. A handler registered
//! under two keys that both match a plugin runs once per key.

use crate::core::error_handling::BoxError;
use crate::plugin::traits::Plugin;
use crate::plugin::types::{Capability, HandlerKey, PluginId};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

/// Extra arguments stored with a handler and passed after the plugin instance
pub type HandlerArgs = Vec<Value>;

type LoadHandlerFn =
    Arc<dyn Fn(Arc<dyn Plugin>, HandlerArgs) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

type RemoveHandlerFn = Arc<dyn Fn(&Arc<dyn Plugin>, &[Value]) -> Result<(), BoxError> + Send + Sync>;

/// Handler run during loading, after event listeners and before boot
#[derive(Clone)]
pub struct LoadHandler(LoadHandlerFn);

impl LoadHandler {
    /// Handler that may suspend; the load waits for it to finish
    pub fn future<F, Fut>(handler: F) -> Self
    where
        F: Fn(Arc<dyn Plugin>, HandlerArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        LoadHandler(Arc::new(move |plugin, args| handler(plugin, args).boxed()))
    }

    pub fn sync<F>(handler: F) -> Self
    where
        F: Fn(&Arc<dyn Plugin>, &[Value]) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self::future(move |plugin, args| std::future::ready(handler(&plugin, &args)))
    }

    pub(crate) async fn invoke(&self, plugin: Arc<dyn Plugin>, args: HandlerArgs) -> Result<(), BoxError> {
        (self.0)(plugin, args).await
    }
}

/// Handler run when a loaded plugin is removed
#[derive(Clone)]
pub struct RemoveHandler(RemoveHandlerFn);

impl RemoveHandler {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Arc<dyn Plugin>, &[Value]) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        RemoveHandler(Arc::new(handler))
    }

    pub(crate) fn invoke(&self, plugin: &Arc<dyn Plugin>, args: &[Value]) -> Result<(), BoxError> {
        (self.0)(plugin, args)
    }
}

#[derive(Clone)]
pub(crate) struct HandlerEntry<H> {
    pub handler: H,
    pub extra_args: HandlerArgs,
}

/// Handlers grouped by key, preserving first-registration order of keys
pub(crate) struct HandlerTable<H> {
    keys: Vec<(HandlerKey, Vec<HandlerEntry<H>>)>,
}

impl<H: Clone> HandlerTable<H> {
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    pub fn register(&mut self, key: HandlerKey, handler: H, extra_args: HandlerArgs) {
        let entry = HandlerEntry { handler, extra_args };
        match self.keys.iter_mut().find(|(existing, _)| existing == &key) {
            Some((_, entries)) => entries.push(entry),
            None => self.keys.push((key, vec![entry])),
        }
    }

    /// Handlers that apply to a plugin with `id` and `capabilities`, in run order
    pub fn matching(&self, id: &PluginId, capabilities: &HashSet<Capability>) -> Vec<HandlerEntry<H>> {
        self.keys
            .iter()
            .filter(|(key, _)| match key {
                HandlerKey::Plugin(target) => target == id,
                HandlerKey::Capability(capability) => capabilities.contains(capability),
            })
            .flat_map(|(_, entries)| entries.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keys.iter().map(|(_, entries)| entries.len()).sum()
    }
}

impl<H: Clone> Default for HandlerTable<H> {
    fn default() -> Self {
        Self::new()
    }
}
