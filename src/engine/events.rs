//! MikroDB - Event Hook
//! Synchronous change-data-capture notifications emitted by the table
//! manager.
//!
//! Fan-out to externally configured HTTP targets is out of scope here: this
//! module only defines the hook interface the core invokes. A collaborator
//! that wants best-effort POST delivery registers an [`EventListener`] that
//! does it.

use crate::types::{Record, TableName};

/// The four event kinds the core ever emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ItemWritten,
    ItemDeleted,
    ItemExpired,
    TableDeleted,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::ItemWritten => "item.written",
            EventKind::ItemDeleted => "item.deleted",
            EventKind::ItemExpired => "item.expired",
            EventKind::TableDeleted => "table.deleted",
        }
    }
}

/// Payload carried by every emitted event.
#[derive(Debug, Clone)]
pub struct Event {
    pub operation: EventKind,
    pub table: TableName,
    pub key: Option<String>,
    pub record: Option<Record>,
}

impl Event {
    pub fn new(operation: EventKind, table: impl Into<String>) -> Self {
        Self {
            operation,
            table: table.into(),
            key: None,
            record: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_record(mut self, record: Record) -> Self {
        self.record = Some(record);
        self
    }
}

/// A local subscriber to engine events. Dispatch is synchronous and
/// in-process; a failing listener never fails the originating mutation.
pub trait EventListener: Send + Sync {
    fn handle(&self, event: &Event);
}

/// Fan-out point the table manager holds. Listener failures (panics are not
/// caught; a listener is expected not to panic) are isolated per-listener so
/// one bad subscriber doesn't block the rest.
#[derive(Default)]
pub struct EventHook {
    listeners: Vec<Box<dyn EventListener>>,
}

impl EventHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }

    /// Dispatch `event` to every registered listener.
    pub fn emit(&self, event: Event) {
        for listener in &self.listeners {
            listener.handle(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use std::sync::{Arc, Mutex};

    struct RecordingListener {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl EventListener for RecordingListener {
        fn handle(&self, event: &Event) {
            self.seen.lock().unwrap().push(event.operation.as_str().to_string());
        }
    }

    #[test]
    fn emit_dispatches_to_all_listeners() {
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(Vec::new()));

        let mut hook = EventHook::new();
        hook.register(Box::new(RecordingListener { seen: seen_a.clone() }));
        hook.register(Box::new(RecordingListener { seen: seen_b.clone() }));

        hook.emit(
            Event::new(EventKind::ItemWritten, "users")
                .with_key("u1")
                .with_record(Record {
                    value: Value::I32(1),
                    version: 1,
                    timestamp: 0,
                    expiration: None,
                }),
        );

        assert_eq!(*seen_a.lock().unwrap(), vec!["item.written".to_string()]);
        assert_eq!(*seen_b.lock().unwrap(), vec!["item.written".to_string()]);
    }

    #[test]
    fn event_kind_as_str_matches_dotted_names() {
        assert_eq!(EventKind::ItemWritten.as_str(), "item.written");
        assert_eq!(EventKind::ItemDeleted.as_str(), "item.deleted");
        assert_eq!(EventKind::ItemExpired.as_str(), "item.expired");
        assert_eq!(EventKind::TableDeleted.as_str(), "table.deleted");
    }

    #[test]
    fn no_listeners_is_a_no_op() {
        let hook = EventHook::new();
        hook.emit(Event::new(EventKind::TableDeleted, "sessions"));
        assert_eq!(hook.listener_count(), 0);
    }
}
