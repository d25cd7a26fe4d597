//! The event emitter.
//!
//! Mutations queue semantic events as they happen; the queue is flushed to
//! the sink once per committed transaction, deduplicated so one semantic
//! change produces one event no matter how many intermediate mutations led
//! to it.

pub use colonnade_ipc::{Event, InputChange, WindowChange, WorkspaceChange};

/// Where flushed events go. The engine treats this as fully opaque; an
/// embedder typically forwards to its IPC subscribers.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

impl<F: FnMut(Event)> EventSink for F {
    fn emit(&mut self, event: Event) {
        self(event)
    }
}

#[derive(Debug, Default)]
pub struct Events {
    queue: Vec<Event>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the next flush. Exact duplicates collapse.
    pub fn push(&mut self, event: Event) {
        if !self.queue.contains(&event) {
            self.queue.push(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drain the queue into `sink`, in emission order.
    pub fn flush(&mut self, sink: &mut dyn EventSink) {
        for event in self.queue.drain(..) {
            sink.emit(event);
        }
    }

    /// Drain the queue into a plain vector (for embedders that poll).
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_events_collapse() {
        let mut events = Events::new();
        let event = Event::Window {
            change: WindowChange::Move,
            id: 3,
            title: None,
        };
        events.push(event.clone());
        events.push(event.clone());
        events.push(Event::Shutdown);

        let mut seen = Vec::new();
        events.flush(&mut |event: Event| seen.push(event));
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], event);
        assert!(events.is_empty());
    }
}
