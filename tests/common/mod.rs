//! Common test utilities and helpers
//!
//! A scriptable host application and helpers for building engines whose
//! events are recorded into a shared journal.

#![allow(dead_code)]

pub mod scripted_app;

use plugin_engine::core::config::EngineConfig;
use plugin_engine::core::error_handling::BoxError;
use plugin_engine::engine::api::Engine;
use plugin_engine::plugin::api::ObjectFactory;
use std::sync::{Arc, Mutex};

pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

pub fn count(journal: &Journal, entry: &str) -> usize {
    journal
        .lock()
        .unwrap()
        .iter()
        .filter(|recorded| recorded.as_str() == entry)
        .count()
}

/// Engine that never installs platform signal handlers or exits the process
pub fn quiet_engine(factory: Arc<dyn ObjectFactory>) -> Arc<Engine> {
    Arc::new(Engine::with_config(factory, EngineConfig::without_interrupts()))
}

/// Record `event:bootup` and `event:shutdown` into `journal`
pub fn record_engine_events(engine: &Engine, journal: &Journal) {
    let bootup = journal.clone();
    engine.on_engine_bootup(move |_| {
        let journal = bootup.clone();
        async move {
            journal.lock().unwrap().push("event:bootup".to_string());
            Ok::<(), BoxError>(())
        }
    });
    let shutdown = journal.clone();
    engine.on_engine_shutdown(move |_| {
        let journal = shutdown.clone();
        async move {
            journal.lock().unwrap().push("event:shutdown".to_string());
            Ok::<(), BoxError>(())
        }
    });
}
