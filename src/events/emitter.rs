//! Event emitter
//!
//! Listeners run one at a time in registration order and each one is awaited
//! before the next starts. The listener table is only locked to take a
//! snapshot, so a listener may add or remove listeners while an emission is in
//! progress; such changes apply from the next emission on.

use crate::core::error_handling::BoxError;
use crate::core::sync::recover_mutex;
use crate::events::error::{EventError, EventResult};
use crate::events::event::{Event, EventKind};
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Handle returned by [`EventEmitter::on`], used to remove the listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerFn = Arc<dyn Fn(Event) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

#[derive(Clone)]
struct ListenerEntry {
    id: ListenerId,
    kind: EventKind,
    listener: ListenerFn,
}

pub struct EventEmitter {
    listeners: Mutex<Vec<ListenerEntry>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = recover_mutex(self.listeners.lock());
        f.debug_struct("EventEmitter")
            .field(
                "listeners",
                &listeners
                    .iter()
                    .map(|entry| (entry.id, entry.kind.to_string()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl EventEmitter {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register an async listener for `kind`
    pub fn on<F, Fut>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        log::trace!("EventEmitter: listener {:?} registered for '{}'", id, kind);

        let listener: ListenerFn = Arc::new(move |event| listener(event).boxed());
        recover_mutex(self.listeners.lock()).push(ListenerEntry { id, kind, listener });
        id
    }

    /// Register a listener that completes without suspending
    pub fn on_sync<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on(kind, move |event| std::future::ready(listener(&event)))
    }

    /// Remove a listener; returns false if it was not registered
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = recover_mutex(self.listeners.lock());
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        before != listeners.len()
    }

    /// Remove every listener for `kind`, returning how many were removed
    pub fn clear(&self, kind: &EventKind) -> usize {
        let mut listeners = recover_mutex(self.listeners.lock());
        let before = listeners.len();
        listeners.retain(|entry| &entry.kind != kind);
        before - listeners.len()
    }

    pub fn listener_count(&self, kind: &EventKind) -> usize {
        recover_mutex(self.listeners.lock())
            .iter()
            .filter(|entry| &entry.kind == kind)
            .count()
    }

    /// Deliver `event` to every listener registered for its kind
    ///
    /// The first listener failure stops the emission and is returned; later
    /// listeners do not run.
    pub async fn emit(&self, event: Event) -> EventResult<()> {
        let kind = event.kind();
        let snapshot: Vec<ListenerEntry> = recover_mutex(self.listeners.lock())
            .iter()
            .filter(|entry| entry.kind == kind)
            .cloned()
            .collect();

        log::trace!(
            "EventEmitter: emitting '{}' to {} listeners",
            kind,
            snapshot.len()
        );

        for entry in snapshot {
            (entry.listener)(event.clone())
                .await
                .map_err(|source| EventError::ListenerFailed {
                    event: kind.to_string(),
                    listener: entry.id,
                    source,
                })?;
        }
        Ok(())
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}
