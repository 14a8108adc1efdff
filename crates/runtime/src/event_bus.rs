use foundation::time::Millis;
use serde::Serialize;

/// A recorded event and the engine time it was emitted at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stamped<E> {
    pub at: Millis,
    #[serde(flatten)]
    pub event: E,
}

/// Append-only trace of engine decisions.
///
/// Cheap enough to keep on in production builds; hosts drain it periodically
/// (or never, for short stories).
#[derive(Debug)]
pub struct EventBus<E> {
    events: Vec<Stamped<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, at: Millis, event: E) {
        self.events.push(Stamped { at, event });
    }

    pub fn events(&self) -> &[Stamped<E>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Stamped<E>> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;
    use foundation::time::Millis;

    #[test]
    fn records_events_with_time() {
        let mut bus = EventBus::new();
        bus.emit(Millis(2), "hello");
        assert_eq!(bus.len(), 1);
        assert_eq!(bus.events()[0].at, Millis(2));
        assert_eq!(bus.events()[0].event, "hello");
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(Millis(0), 1u8);
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.is_empty());
    }
}
