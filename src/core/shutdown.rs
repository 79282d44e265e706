//! Interrupt coordination
//!
//! An [`InterruptHandle`] is the engine's long-lived interrupt line: anything
//! holding a clone can raise it. While a run is in progress the engine holds an
//! [`InterruptWatcher`] subscribed to that line and, optionally, forwarding the
//! platform's interrupt signals into it. The watcher never keeps the run-loop
//! alive on its own; it is only ever polled alongside the main sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Cloneable sender side of the interrupt line
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    interrupt_tx: broadcast::Sender<()>,
    interrupt_requested: Arc<AtomicBool>,
}

impl InterruptHandle {
    pub fn new() -> Self {
        let (interrupt_tx, _) = broadcast::channel(8);
        Self {
            interrupt_tx,
            interrupt_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Raise the interrupt
    ///
    /// Only a watcher that is enabled at this moment observes it; an interrupt
    /// raised while the engine is idle is recorded but otherwise ignored.
    pub fn interrupt(&self) {
        self.interrupt_requested.store(true, Ordering::Release);
        let _ = self.interrupt_tx.send(());
    }

    pub fn is_interrupt_requested(&self) -> bool {
        self.interrupt_requested.load(Ordering::Acquire)
    }

    pub(crate) fn reset(&self) {
        self.interrupt_requested.store(false, Ordering::Release);
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.interrupt_tx.subscribe()
    }
}

impl Default for InterruptHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-run listener on an [`InterruptHandle`]
pub struct InterruptWatcher {
    interrupt_rx: broadcast::Receiver<()>,
    signal_task: Option<JoinHandle<()>>,
    enabled: bool,
}

impl InterruptWatcher {
    /// Start watching `handle`
    ///
    /// With `platform_signals` set, a background task forwards the platform
    /// interrupt into the handle; a second signal while the first is still
    /// being handled exits immediately with `force_exit_code`. Must be called
    /// from within a tokio runtime.
    pub fn watch(handle: &InterruptHandle, platform_signals: bool, force_exit_code: i32) -> Self {
        let signal_task =
            platform_signals.then(|| spawn_signal_forwarder(handle.clone(), force_exit_code));

        Self {
            interrupt_rx: handle.subscribe(),
            signal_task,
            enabled: true,
        }
    }

    /// Resolve once the interrupt is raised
    ///
    /// Never resolves after [`disable`](Self::disable), or if every sender is gone.
    pub async fn triggered(&mut self) {
        if !self.enabled {
            return std::future::pending().await;
        }
        loop {
            match self.interrupt_rx.recv().await {
                Ok(()) | Err(RecvError::Lagged(_)) => return,
                Err(RecvError::Closed) => return std::future::pending().await,
            }
        }
    }

    /// Stop watching; idempotent
    pub fn disable(&mut self) {
        if let Some(task) = self.signal_task.take() {
            task.abort();
        }
        if self.enabled {
            log::trace!("InterruptWatcher: disabled");
        }
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Drop for InterruptWatcher {
    fn drop(&mut self) {
        self.disable();
    }
}

fn spawn_signal_forwarder(handle: InterruptHandle, force_exit_code: i32) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if !wait_for_platform_interrupt().await {
                log::debug!("InterruptWatcher: platform signals unavailable");
                return;
            }
            if handle.is_interrupt_requested() {
                log::warn!("Interrupt received twice; exiting");
                std::process::exit(force_exit_code);
            }
            log::info!("Interrupt received");
            handle.interrupt();
        }
    })
}

// Returns false when no signal stream could be installed
#[cfg(unix)]
async fn wait_for_platform_interrupt() -> bool {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut interrupt, mut terminate) =
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(interrupt), Ok(terminate)) => (interrupt, terminate),
            _ => return tokio::signal::ctrl_c().await.is_ok(),
        };

    tokio::select! {
        received = interrupt.recv() => received.is_some(),
        received = terminate.recv() => received.is_some(),
    }
}

#[cfg(not(unix))]
async fn wait_for_platform_interrupt() -> bool {
    tokio::signal::ctrl_c().await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_handle_starts_clear() {
        let handle = InterruptHandle::new();
        assert!(!handle.is_interrupt_requested());
    }

    #[tokio::test]
    async fn test_watcher_observes_interrupt() {
        let handle = InterruptHandle::new();
        let mut watcher = InterruptWatcher::watch(&handle, false, 130);

        handle.interrupt();

        let observed = timeout(Duration::from_millis(100), watcher.triggered()).await;
        assert!(observed.is_ok(), "Watcher should observe the interrupt");
        assert!(handle.is_interrupt_requested());
    }

    #[tokio::test]
    async fn test_interrupt_before_watch_is_not_observed() {
        let handle = InterruptHandle::new();
        handle.interrupt();
        handle.reset();

        let mut watcher = InterruptWatcher::watch(&handle, false, 130);
        let observed = timeout(Duration::from_millis(50), watcher.triggered()).await;
        assert!(observed.is_err(), "Earlier interrupt must not leak into a new run");
    }

    #[tokio::test]
    async fn test_disabled_watcher_never_resolves() {
        let handle = InterruptHandle::new();
        let mut watcher = InterruptWatcher::watch(&handle, true, 130);
        watcher.disable();
        watcher.disable();
        assert!(!watcher.is_enabled());

        handle.interrupt();
        let observed = timeout(Duration::from_millis(50), watcher.triggered()).await;
        assert!(observed.is_err());
    }

    #[tokio::test]
    async fn test_multiple_watchers_share_one_handle() {
        let handle = InterruptHandle::new();
        let mut first = InterruptWatcher::watch(&handle, false, 130);
        let mut second = InterruptWatcher::watch(&handle.clone(), false, 130);

        handle.interrupt();

        assert!(timeout(Duration::from_millis(100), first.triggered()).await.is_ok());
        assert!(timeout(Duration::from_millis(100), second.triggered()).await.is_ok());
    }
}
