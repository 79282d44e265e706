//! Host application whose behaviour is scripted per test

use super::Journal;
use plugin_engine::core::error_handling::BoxError;
use plugin_engine::engine::api::{Application, Engine, EngineError};
use plugin_engine::plugin::api::{Pluggable, PluginError, PluginId};
use std::error::Error as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Failure raised by a scripted `start`, recognisable after boxing
#[derive(Debug, Error)]
#[error("start failed: {reason}")]
pub struct StartFailure {
    pub reason: String,
}

#[derive(Debug, Default, Clone)]
pub struct Script {
    /// Plugins registered (once) and loaded by `load_plugins`
    pub plugins: Vec<PluginId>,
    pub fail_load: bool,
    pub fail_start: Option<String>,
    pub panic_in_start: bool,
    pub start_delay: Option<Duration>,
    pub fail_stop: bool,
    pub fail_exception_handler: bool,
    pub panic_in_exception_handler: bool,
    /// Call `run` on the same engine from inside `start`
    pub reenter: bool,
}

pub struct ScriptedApp {
    engine: Arc<Engine>,
    script: Script,
    journal: Journal,
    /// Every error passed to `handle_exception`, rendered with its source
    pub exceptions: Mutex<Vec<String>>,
    /// Result of the nested `run` when `reenter` is set
    pub reentry: Mutex<Option<EngineError>>,
}

impl ScriptedApp {
    pub fn new(engine: Arc<Engine>, script: Script, journal: Journal) -> Self {
        Self {
            engine,
            script,
            journal,
            exceptions: Mutex::new(Vec::new()),
            reentry: Mutex::new(None),
        }
    }

    fn record(&self, entry: impl Into<String>) {
        self.journal.lock().unwrap().push(entry.into());
    }

    pub fn exceptions(&self) -> Vec<String> {
        self.exceptions.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Application for ScriptedApp {
    async fn load_plugins(&self) -> Result<(), BoxError> {
        self.record("app:load_plugins");
        if self.script.fail_load {
            return Err("plugin source unavailable".into());
        }

        let plugins = self.engine.plugins();
        for id in &self.script.plugins {
            if !plugins.has_plugin_been_registered(id).await {
                plugins.register_plugin(id.clone()).await?;
            }
        }
        plugins.load_plugins().await?;
        Ok(())
    }

    async fn start(&self) -> Result<(), BoxError> {
        self.record("app:start");

        if self.script.reenter {
            if let Err(error) = self.engine.run(self) {
                *self.reentry.lock().unwrap() = Some(error);
            }
        }
        if let Some(delay) = self.script.start_delay {
            tokio::time::sleep(delay).await;
        }
        if self.script.panic_in_start {
            panic!("start exploded");
        }
        if let Some(reason) = &self.script.fail_start {
            return Err(Box::new(StartFailure {
                reason: reason.clone(),
            }));
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), BoxError> {
        self.record("app:stop");
        if self.script.fail_stop {
            return Err("stop failed".into());
        }
        Ok(())
    }

    fn handle_exception(&self, error: &EngineError) -> Result<(), BoxError> {
        self.record(format!("app:exception:{}", error.code()));

        let mut rendered = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            rendered.push_str(" <- ");
            rendered.push_str(&cause.to_string());
            source = cause.source();
        }
        if let EngineError::Application { source, .. } = error {
            if let Some(failure) = source.downcast_ref::<StartFailure>() {
                rendered.push_str(&format!(" [start failure: {}]", failure.reason));
            }
            if let Some(plugin_error) = source.downcast_ref::<PluginError>() {
                rendered.push_str(&format!(" [plugin error: {}]", plugin_error));
            }
        }
        self.exceptions.lock().unwrap().push(rendered);

        if self.script.panic_in_exception_handler {
            panic!("exception handler exploded");
        }
        if self.script.fail_exception_handler {
            return Err("exception handler failed".into());
        }
        Ok(())
    }
}
