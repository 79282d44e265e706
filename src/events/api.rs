//! Public API for the event system

pub use crate::events::emitter::{EventEmitter, ListenerId};
pub use crate::events::error::{EventError, EventResult};
pub use crate::events::event::{CustomEvent, Event, EventKind, SystemEvent, SystemEventType};
