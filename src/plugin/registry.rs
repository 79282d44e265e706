//! Plugin Registry
//!
//! Ordered record of every registered plugin: its descriptor, its phase, and
//! once constructed its instance and capabilities. The registry itself holds
//! no lock; the manager owns it behind its own.

use crate::plugin::descriptor::PluginDescriptor;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::traits::Plugin;
use crate::plugin::types::{Capability, PluginId, PluginPhase};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Everything the manager tracks about one plugin
pub struct PluginRecord {
    pub id: PluginId,
    pub descriptor: PluginDescriptor,
    pub instance: Option<Arc<dyn Plugin>>,
    pub capabilities: HashSet<Capability>,
    pub phase: PluginPhase,
}

impl std::fmt::Debug for PluginRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRecord")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("constructed", &self.instance.is_some())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl PluginRecord {
    pub fn new(descriptor: PluginDescriptor) -> Self {
        Self {
            id: descriptor.id().clone(),
            descriptor,
            instance: None,
            capabilities: HashSet::new(),
            phase: PluginPhase::Registered,
        }
    }

    /// Drop the instance and return to `Registered`
    pub fn reset(&mut self) {
        self.instance = None;
        self.capabilities.clear();
        self.phase = PluginPhase::Registered;
    }
}

/// Registered plugins in registration order
#[derive(Debug, Default)]
pub struct PluginRegistry {
    order: Vec<PluginId>,
    records: HashMap<PluginId, PluginRecord>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, descriptor: PluginDescriptor) -> PluginResult<()> {
        let id = descriptor.id().clone();
        if self.records.contains_key(&id) {
            return Err(PluginError::invalid_argument(format!(
                "Plugin '{}' is already registered",
                id
            )));
        }

        self.order.push(id.clone());
        self.records.insert(id, PluginRecord::new(descriptor));
        Ok(())
    }

    pub fn contains(&self, id: &PluginId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &PluginId) -> Option<&PluginRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &PluginId) -> Option<&mut PluginRecord> {
        self.records.get_mut(id)
    }

    pub fn remove(&mut self, id: &PluginId) -> Option<PluginRecord> {
        let record = self.records.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(record)
    }

    /// Identities in registration order
    pub fn ids(&self) -> Vec<PluginId> {
        self.order.clone()
    }

    /// Records in registration order
    pub fn records(&self) -> impl Iterator<Item = &PluginRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
