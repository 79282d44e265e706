//! Run-loop engine
//!
//! [`Engine::run`] drives one run of a host [`Application`]:
//!
//! 1. `Idle` → `Running`, or fail with [`EngineError::NotIdle`]
//! 2. watch for interrupts while step 3 runs
//! 3. `load_plugins`, the bootup event (first run only), `start`
//! 4. the shutdown event, then back to `Idle`
//!
//! Every failure of step 3 or 4, panics included, ends up in one place: the
//! engine moves to `Crashed`, hands the error to
//! [`Application::handle_exception`] and still emits the shutdown event if
//! this run has not emitted it yet. Nothing raised by the application or a
//! listener escapes `run`.

use crate::core::config::EngineConfig;
use crate::core::error_handling::{log_error_with_context, BoxError};
use crate::core::shutdown::{InterruptHandle, InterruptWatcher};
use crate::core::sync::recover_mutex;
use crate::engine::application::Application;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::state::{AppOperation, EngineState};
use crate::events::api::{Event, EventEmitter, EventKind, ListenerId};
use crate::plugin::api::{ObjectFactory, SharedPluginManager};
use futures::FutureExt;
use log::{debug, error, info, warn};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Shutdown event messages for runs that did not complete
pub const SHUTDOWN_CRASHED: &str = "crashed";
pub const SHUTDOWN_INTERRUPTED: &str = "interrupted";

enum RunOutcome {
    Completed(EngineResult<()>),
    Panicked(String),
    Interrupted,
}

pub struct Engine {
    state: Mutex<EngineState>,
    /// Set by the first run that gets past plugin loading
    booted: AtomicBool,
    emitter: Arc<EventEmitter>,
    plugins: SharedPluginManager,
    factory: Arc<dyn ObjectFactory>,
    interrupt: InterruptHandle,
    config: EngineConfig,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.get_state())
            .field("booted", &self.has_booted())
            .field("config", &self.config)
            .finish()
    }
}

impl Engine {
    pub fn new(factory: Arc<dyn ObjectFactory>) -> Self {
        Self::with_config(factory, EngineConfig::default())
    }

    pub fn with_config(factory: Arc<dyn ObjectFactory>, config: EngineConfig) -> Self {
        let emitter = Arc::new(EventEmitter::new());
        let plugins = SharedPluginManager::new(factory.clone(), emitter.clone());
        Self {
            state: Mutex::new(EngineState::Idle),
            booted: AtomicBool::new(false),
            emitter,
            plugins,
            factory,
            interrupt: InterruptHandle::new(),
            config,
        }
    }

    pub fn get_state(&self) -> EngineState {
        *recover_mutex(self.state.lock())
    }

    pub fn get_emitter(&self) -> &Arc<EventEmitter> {
        &self.emitter
    }

    /// The plugin manager shared with the host application
    pub fn plugins(&self) -> &SharedPluginManager {
        &self.plugins
    }

    pub fn factory(&self) -> &Arc<dyn ObjectFactory> {
        &self.factory
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle that raises the interrupt for the run in progress
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// Whether the bootup event has been emitted by this engine
    pub fn has_booted(&self) -> bool {
        self.booted.load(Ordering::Acquire)
    }

    pub fn on_engine_bootup<F, Fut>(&self, listener: F) -> ListenerId
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.emitter.on(EventKind::Bootup, listener)
    }

    /// Listen for the end of each run
    ///
    /// The event carries [`SHUTDOWN_CRASHED`] or [`SHUTDOWN_INTERRUPTED`] as
    /// its message when the run did not complete normally.
    pub fn on_engine_shutdown<F, Fut>(&self, listener: F) -> ListenerId
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.emitter.on(EventKind::Shutdown, listener)
    }

    /// Run `app` to completion on a fresh current-thread runtime
    ///
    /// Blocks until the run has finished, crashed or been interrupted. Only
    /// [`EngineError::NotIdle`] and runtime construction failures are returned;
    /// failures of the run itself go to the application's exception handler.
    /// Must not be called from inside an async context unless the engine is
    /// busy, in which case it returns `NotIdle` straight away.
    pub fn run(&self, app: &dyn Application) -> EngineResult<()> {
        self.ensure_idle()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| EngineError::Runtime { source })?;
        runtime.block_on(self.run_async(app))
    }

    /// [`run`](Self::run) for hosts already inside a tokio runtime
    pub async fn run_async(&self, app: &dyn Application) -> EngineResult<()> {
        self.begin_run()?;
        info!("Engine: run started");

        self.interrupt.reset();
        let mut watcher = InterruptWatcher::watch(
            &self.interrupt,
            self.config.install_interrupt_watcher,
            self.config.interrupt_exit_code,
        );
        let shutdown_emitted = AtomicBool::new(false);

        let outcome = {
            let main = AssertUnwindSafe(self.main_sequence(app)).catch_unwind();
            tokio::select! {
                biased;
                result = main => match result {
                    Ok(result) => RunOutcome::Completed(result),
                    Err(payload) => RunOutcome::Panicked(panic_message(payload.as_ref())),
                },
                _ = watcher.triggered() => RunOutcome::Interrupted,
            }
        };

        match outcome {
            RunOutcome::Completed(Ok(())) => {
                self.finish(app, &mut watcher, &shutdown_emitted).await;
            }
            RunOutcome::Completed(Err(error)) => {
                self.crash(app, error, &mut watcher, &shutdown_emitted).await;
            }
            RunOutcome::Panicked(message) => {
                self.crash(
                    app,
                    EngineError::Panicked { message },
                    &mut watcher,
                    &shutdown_emitted,
                )
                .await;
            }
            RunOutcome::Interrupted => {
                self.interrupted(app, &mut watcher, &shutdown_emitted).await;
            }
        }
        Ok(())
    }

    async fn main_sequence(&self, app: &dyn Application) -> EngineResult<()> {
        app.load_plugins()
            .await
            .map_err(|source| EngineError::Application {
                operation: AppOperation::LoadPlugins,
                source,
            })?;

        if !self.booted.swap(true, Ordering::AcqRel) {
            debug!("Engine: first boot, emitting bootup event");
            self.emitter.emit(Event::bootup()).await?;
        }

        app.start().await.map_err(|source| EngineError::Application {
            operation: AppOperation::Start,
            source,
        })?;
        Ok(())
    }

    /// Shutdown after a successful start
    ///
    /// Runs outside the interrupt race, so an interrupt arriving now cannot
    /// cut the shutdown listeners short.
    async fn finish(
        &self,
        app: &dyn Application,
        watcher: &mut InterruptWatcher,
        shutdown_emitted: &AtomicBool,
    ) {
        shutdown_emitted.store(true, Ordering::Release);
        let emitted = AssertUnwindSafe(self.emitter.emit(Event::shutdown()))
            .catch_unwind()
            .await;

        match emitted {
            Ok(Ok(())) => {
                watcher.disable();
                self.set_state(EngineState::Idle);
                info!("Engine: run completed");
            }
            Ok(Err(error)) => {
                self.crash(app, EngineError::from(error), watcher, shutdown_emitted)
                    .await;
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.crash(app, EngineError::Panicked { message }, watcher, shutdown_emitted)
                    .await;
            }
        }
    }

    /// The single recovery point for a failed run
    async fn crash(
        &self,
        app: &dyn Application,
        error: EngineError,
        watcher: &mut InterruptWatcher,
        shutdown_emitted: &AtomicBool,
    ) {
        watcher.disable();
        self.set_state(EngineState::Crashed);
        log_error_with_context(&error, "Engine: run crashed");

        match std::panic::catch_unwind(AssertUnwindSafe(|| app.handle_exception(&error))) {
            Ok(Ok(())) => {}
            Ok(Err(secondary)) => {
                error!("Engine: exception handler failed: {}", secondary);
            }
            Err(payload) => {
                error!(
                    "Engine: exception handler panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }

        self.emit_shutdown_once(shutdown_emitted, SHUTDOWN_CRASHED).await;
    }

    async fn interrupted(
        &self,
        app: &dyn Application,
        watcher: &mut InterruptWatcher,
        shutdown_emitted: &AtomicBool,
    ) {
        warn!("Engine: interrupted, stopping application");
        if let Err(source) = app.stop().await {
            let error = EngineError::Application {
                operation: AppOperation::Stop,
                source,
            };
            log_error_with_context(&error, "Engine: application stop failed");
        }

        self.emit_shutdown_once(shutdown_emitted, SHUTDOWN_INTERRUPTED).await;
        watcher.disable();

        if self.config.exit_on_interrupt {
            info!(
                "Engine: exiting with code {}",
                self.config.interrupt_exit_code
            );
            std::process::exit(self.config.interrupt_exit_code);
        }

        self.set_state(EngineState::Idle);
        info!("Engine: run interrupted");
    }

    /// Emit shutdown tagged with `reason` unless this run already did;
    /// failures are only logged
    async fn emit_shutdown_once(&self, shutdown_emitted: &AtomicBool, reason: &str) {
        if shutdown_emitted.swap(true, Ordering::AcqRel) {
            return;
        }

        match AssertUnwindSafe(self.emitter.emit(Event::shutdown_with_reason(reason)))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                log_error_with_context(&EngineError::from(error), "Engine: shutdown listener failed");
            }
            Err(payload) => {
                error!(
                    "Engine: shutdown listener panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
    }

    fn ensure_idle(&self) -> EngineResult<()> {
        let state = self.get_state();
        if state != EngineState::Idle {
            warn!("Engine: run rejected, engine is {}", state);
            return Err(EngineError::NotIdle { state });
        }
        Ok(())
    }

    fn begin_run(&self) -> EngineResult<()> {
        let mut state = recover_mutex(self.state.lock());
        if *state != EngineState::Idle {
            warn!("Engine: run rejected, engine is {}", *state);
            return Err(EngineError::NotIdle { state: *state });
        }
        *state = EngineState::Running;
        Ok(())
    }

    fn set_state(&self, next: EngineState) {
        let mut state = recover_mutex(self.state.lock());
        debug!("Engine: {} -> {}", *state, next);
        *state = next;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
