//! Plugin Test Utilities
//!
//! A configurable recording plugin and a test bed wiring it into a container,
//! so the suites can assert on the exact order hooks ran in.

use crate::core::error_handling::BoxError;
use crate::events::api::{EventEmitter, EventKind, ListenerId};
use crate::plugin::container::{Container, ObjectFactory, ServiceInstance};
use crate::plugin::descriptor::PluginDescriptor;
use crate::plugin::manager::PluginManager;
use crate::plugin::traits::{Bootable, EventAware, Plugin, ServiceAware};
use crate::plugin::types::{PluginHook, PluginId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type Journal = Arc<Mutex<Vec<String>>>;

/// Which hooks a recording plugin implements, and where it fails
#[derive(Debug, Clone, Default)]
pub struct Behaviour {
    pub service_aware: bool,
    pub event_aware: bool,
    pub bootable: bool,
    pub interfaces: Vec<String>,
    pub fail_construct: bool,
    pub fail_at: Option<PluginHook>,
    pub boot_delay: Option<Duration>,
    /// Delay for the first boot only, shared by every instance built from
    /// this behaviour
    pub first_boot_delay: Option<Duration>,
    pub first_boot_started: Arc<AtomicBool>,
}

impl Behaviour {
    pub fn plain() -> Self {
        Self::default()
    }

    /// Service-aware, event-aware and bootable
    pub fn full() -> Self {
        Self {
            service_aware: true,
            event_aware: true,
            bootable: true,
            ..Self::default()
        }
    }

    pub fn bootable() -> Self {
        Self {
            bootable: true,
            ..Self::default()
        }
    }

    pub fn event_aware() -> Self {
        Self {
            event_aware: true,
            ..Self::default()
        }
    }

    pub fn failing_at(mut self, hook: PluginHook) -> Self {
        self.fail_at = Some(hook);
        self
    }

    pub fn failing_construction(mut self) -> Self {
        self.fail_construct = true;
        self
    }

    pub fn with_interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn with_boot_delay(mut self, delay: Duration) -> Self {
        self.boot_delay = Some(delay);
        self
    }

    pub fn with_first_boot_delay(mut self, delay: Duration) -> Self {
        self.first_boot_delay = Some(delay);
        self
    }
}

/// Plugin that appends `<name>:<hook>` to a shared journal for every hook it runs
pub struct RecordingPlugin {
    name: String,
    behaviour: Behaviour,
    journal: Journal,
    listener: Mutex<Option<ListenerId>>,
}

impl RecordingPlugin {
    pub fn new(name: &str, behaviour: Behaviour, journal: Journal) -> Self {
        Self {
            name: name.to_string(),
            behaviour,
            journal,
            listener: Mutex::new(None),
        }
    }

    fn record(&self, step: &str) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, step));
    }

    fn check(&self, hook: PluginHook) -> Result<(), BoxError> {
        if self.behaviour.fail_at == Some(hook) {
            return Err(format!("{} failed during {}", self.name, hook).into());
        }
        Ok(())
    }
}

impl Plugin for RecordingPlugin {
    fn as_service_aware(&self) -> Option<&dyn ServiceAware> {
        self.behaviour.service_aware.then_some(self as &dyn ServiceAware)
    }

    fn as_event_aware(&self) -> Option<&dyn EventAware> {
        self.behaviour.event_aware.then_some(self as &dyn EventAware)
    }

    fn as_bootable(&self) -> Option<&dyn Bootable> {
        self.behaviour.bootable.then_some(self as &dyn Bootable)
    }

    fn interfaces(&self) -> Vec<String> {
        self.behaviour.interfaces.clone()
    }
}

impl ServiceAware for RecordingPlugin {
    fn wire_object_graph(&self, factory: &dyn ObjectFactory) -> Result<(), BoxError> {
        self.record("wire");
        self.check(PluginHook::WireObjectGraph)?;

        let value = format!("provided by {}", self.name);
        factory.bind(
            &service_key(&self.name),
            Arc::new(move |_: &dyn ObjectFactory| -> Result<ServiceInstance, BoxError> {
                Ok(Arc::new(value.clone()))
            }),
        )?;
        Ok(())
    }
}

impl EventAware for RecordingPlugin {
    fn register_event_listeners(&self, emitter: &EventEmitter) -> Result<(), BoxError> {
        self.record("events");
        self.check(PluginHook::RegisterEventListeners)?;

        let journal = self.journal.clone();
        let name = self.name.clone();
        let id = emitter.on_sync(EventKind::Shutdown, move |_| {
            journal.lock().unwrap().push(format!("{}:shutdown", name));
            Ok(())
        });
        *self.listener.lock().unwrap() = Some(id);
        Ok(())
    }

    fn remove_event_listeners(&self, emitter: &EventEmitter) -> Result<(), BoxError> {
        self.record("remove_events");
        self.check(PluginHook::RemoveEventListeners)?;

        if let Some(id) = self.listener.lock().unwrap().take() {
            emitter.off(id);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Bootable for RecordingPlugin {
    async fn boot(&self) -> Result<(), BoxError> {
        if let Some(delay) = self.behaviour.boot_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(delay) = self.behaviour.first_boot_delay {
            if !self.behaviour.first_boot_started.swap(true, Ordering::AcqRel) {
                tokio::time::sleep(delay).await;
            }
        }
        self.record("boot");
        self.check(PluginHook::Boot)
    }
}

/// Key under which a service-aware recording plugin binds its service
pub fn service_key(name: &str) -> String {
    format!("{}.service", name)
}

pub fn descriptor(
    name: &str,
    behaviour: Behaviour,
    dependencies: &[&str],
    journal: &Journal,
) -> PluginDescriptor {
    let plugin_name = name.to_string();
    let journal = journal.clone();
    let descriptor = PluginDescriptor::new(name, move |_| {
        journal
            .lock()
            .unwrap()
            .push(format!("{}:construct", plugin_name));
        if behaviour.fail_construct {
            return Err(format!("{} cannot be constructed", plugin_name).into());
        }
        let plugin: Arc<dyn Plugin> = Arc::new(RecordingPlugin::new(
            &plugin_name,
            behaviour.clone(),
            journal.clone(),
        ));
        Ok(plugin)
    });

    if dependencies.is_empty() {
        descriptor
    } else {
        descriptor.with_dependencies(dependencies.iter().map(|id| PluginId::new(*id)).collect())
    }
}

/// Container, emitter and journal shared by one test
pub struct TestBed {
    pub container: Arc<Container>,
    pub emitter: Arc<EventEmitter>,
    pub journal: Journal,
}

impl TestBed {
    pub fn new() -> Self {
        Self {
            container: Arc::new(Container::new()),
            emitter: Arc::new(EventEmitter::new()),
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make a recording plugin constructible under `name`
    pub fn provide(&self, name: &str, behaviour: Behaviour, dependencies: &[&str]) {
        self.container
            .provide(descriptor(name, behaviour, dependencies, &self.journal))
            .unwrap();
    }

    pub fn manager(&self) -> PluginManager {
        PluginManager::new(self.container.clone(), self.emitter.clone())
    }

    /// Manager with `names` registered in order
    pub fn manager_with(&self, names: &[&str]) -> PluginManager {
        let mut manager = self.manager();
        for name in names {
            manager.register_plugin(PluginId::new(*name)).unwrap();
        }
        manager
    }

    pub fn entries(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    /// Journal entries recorded by `name`
    pub fn entries_for(&self, name: &str) -> Vec<String> {
        let prefix = format!("{}:", name);
        self.entries()
            .into_iter()
            .filter(|entry| entry.starts_with(&prefix))
            .collect()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.journal.lock().unwrap().push(entry.into());
    }
}

pub fn id(name: &str) -> PluginId {
    PluginId::new(name)
}
