//! Typed source lifecycle events and their emitter.
//!
//! Handlers are registered per event kind and dispatched synchronously in
//! registration order; there is no generic event-bus base type.

use std::collections::HashMap;

/// Which lifecycle phase a `data` event announces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPhase {
    /// Anchor and zoom bounds are known
    Metadata,
    /// Coordinates or raster content changed
    Content,
}

/// Events emitted by an overlay source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// The raster fetch has started
    DataLoading { kind: &'static str },
    /// Source data became available or changed
    Data { kind: &'static str, phase: DataPhase },
    /// The raster could not be retrieved
    Error { cause: String },
}

impl SourceEvent {
    pub fn data_loading() -> Self {
        SourceEvent::DataLoading { kind: "source" }
    }

    pub fn data(phase: DataPhase) -> Self {
        SourceEvent::Data {
            kind: "source",
            phase,
        }
    }

    pub fn error(cause: impl Into<String>) -> Self {
        SourceEvent::Error {
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> SourceEventKind {
        match self {
            SourceEvent::DataLoading { .. } => SourceEventKind::DataLoading,
            SourceEvent::Data { .. } => SourceEventKind::Data,
            SourceEvent::Error { .. } => SourceEventKind::Error,
        }
    }
}

/// Event kinds handlers can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceEventKind {
    DataLoading,
    Data,
    Error,
}

/// Token returned by [`EventEmitter::on`], used to unregister the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

type Handler = Box<dyn FnMut(&SourceEvent) + Send>;

/// Per-kind handler registry with synchronous in-order dispatch
#[derive(Default)]
pub struct EventEmitter {
    next_id: u64,
    handlers: HashMap<SourceEventKind, Vec<(HandlerId, Handler)>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `kind`; handlers for the same kind fire in
    /// registration order.
    pub fn on(
        &mut self,
        kind: SourceEventKind,
        handler: impl FnMut(&SourceEvent) + Send + 'static,
    ) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Unregisters a handler. Returns whether it was registered.
    pub fn off(&mut self, kind: SourceEventKind, id: HandlerId) -> bool {
        if let Some(list) = self.handlers.get_mut(&kind) {
            let before = list.len();
            list.retain(|(handler_id, _)| *handler_id != id);
            return list.len() != before;
        }
        false
    }

    /// Dispatches `event` to every handler registered for its kind
    pub fn emit(&mut self, event: &SourceEvent) {
        if let Some(list) = self.handlers.get_mut(&event.kind()) {
            for (_, handler) in list.iter_mut() {
                handler(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_dispatch_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut emitter = EventEmitter::new();

        for tag in ["first", "second", "third"] {
            let seen = seen.clone();
            emitter.on(SourceEventKind::Data, move |_| {
                seen.lock().unwrap().push(tag);
            });
        }

        emitter.emit(&SourceEvent::data(DataPhase::Metadata));
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_handlers_filtered_by_kind() {
        let count = Arc::new(Mutex::new(0));
        let mut emitter = EventEmitter::new();

        let count_clone = count.clone();
        emitter.on(SourceEventKind::Error, move |_| {
            *count_clone.lock().unwrap() += 1;
        });

        emitter.emit(&SourceEvent::data_loading());
        emitter.emit(&SourceEvent::data(DataPhase::Content));
        assert_eq!(*count.lock().unwrap(), 0);

        emitter.emit(&SourceEvent::error("boom"));
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_off_unregisters() {
        let count = Arc::new(Mutex::new(0));
        let mut emitter = EventEmitter::new();

        let count_clone = count.clone();
        let id = emitter.on(SourceEventKind::Data, move |_| {
            *count_clone.lock().unwrap() += 1;
        });

        emitter.emit(&SourceEvent::data(DataPhase::Metadata));
        assert!(emitter.off(SourceEventKind::Data, id));
        assert!(!emitter.off(SourceEventKind::Data, id));
        emitter.emit(&SourceEvent::data(DataPhase::Metadata));

        assert_eq!(*count.lock().unwrap(), 1);
    }
}
