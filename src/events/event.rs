//! Event types for the engine emitter

use std::fmt;
use std::time::SystemTime;

/// Key listeners are registered under
///
/// `Bootup` and `Shutdown` are reserved for the engine; hosts and plugins use
/// `Custom` names for their own events.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Bootup,
    Shutdown,
    Custom(String),
}

impl EventKind {
    pub fn custom(name: impl Into<String>) -> Self {
        EventKind::Custom(name.into())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Bootup => write!(f, "engine.bootup"),
            EventKind::Shutdown => write!(f, "engine.shutdown"),
            EventKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SystemEventType {
    Bootup,
    Shutdown,
}

/// Payload of the two reserved engine events
#[derive(Clone, Debug)]
pub struct SystemEvent {
    pub event_type: SystemEventType,
    pub timestamp: SystemTime,
    pub message: Option<String>,
}

impl SystemEvent {
    pub fn new(event_type: SystemEventType) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            message: None,
        }
    }

    pub fn with_message(event_type: SystemEventType, message: impl Into<String>) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            message: Some(message.into()),
        }
    }
}

/// Payload of a host-defined event
#[derive(Clone, Debug)]
pub struct CustomEvent {
    pub name: String,
    pub timestamp: SystemTime,
    pub payload: serde_json::Value,
}

#[derive(Clone, Debug)]
pub enum Event {
    System(SystemEvent),
    Custom(CustomEvent),
}

impl Event {
    pub fn bootup() -> Self {
        Event::System(SystemEvent::new(SystemEventType::Bootup))
    }

    pub fn shutdown() -> Self {
        Event::System(SystemEvent::new(SystemEventType::Shutdown))
    }

    /// Shutdown of a run that did not complete normally
    pub fn shutdown_with_reason(reason: impl Into<String>) -> Self {
        Event::System(SystemEvent::with_message(SystemEventType::Shutdown, reason))
    }

    /// Message attached to a system event, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            Event::System(system) => system.message.as_deref(),
            Event::Custom(_) => None,
        }
    }

    pub fn custom(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Event::Custom(CustomEvent {
            name: name.into(),
            timestamp: SystemTime::now(),
            payload,
        })
    }

    /// The listener key this event is delivered to
    pub fn kind(&self) -> EventKind {
        match self {
            Event::System(system) => match system.event_type {
                SystemEventType::Bootup => EventKind::Bootup,
                SystemEventType::Shutdown => EventKind::Shutdown,
            },
            Event::Custom(custom) => EventKind::Custom(custom.name.clone()),
        }
    }
}
