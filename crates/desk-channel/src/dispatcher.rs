//! Topic-to-handler dispatch.
//!
//! A handler-list map keyed by typed topic. Handlers are plain callbacks
//! invoked on the channel's read task; they must not block.

use crate::message::{PushEvent, Topic};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque id returned by `on`, used to unsubscribe with `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Arc<dyn Fn(&PushEvent) + Send + Sync>;

/// Handler registry for push events.
#[derive(Default)]
pub struct Dispatcher {
    handlers: RwLock<HashMap<Topic, Vec<(HandlerId, Handler)>>>,
    next_id: AtomicU64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a topic. Multiple handlers per topic are fine.
    pub fn on<F>(&self, topic: Topic, handler: F) -> HandlerId
    where
        F: Fn(&PushEvent) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .entry(topic)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Unsubscribe a handler. Unknown ids are a no-op, not an error.
    ///
    /// Returns whether a handler was actually removed.
    pub fn off(&self, topic: Topic, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write();
        match handlers.get_mut(&topic) {
            Some(list) => {
                let before = list.len();
                list.retain(|(hid, _)| *hid != id);
                before != list.len()
            }
            None => false,
        }
    }

    /// Deliver an event to every handler registered for its topic.
    pub fn emit(&self, event: &PushEvent) {
        // Clone the handler list out of the lock so a handler that calls
        // on/off cannot deadlock the dispatch path.
        let handlers: Vec<Handler> = self
            .handlers
            .read()
            .get(&event.topic)
            .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();

        for handler in handlers {
            handler(event);
        }
    }

    /// Number of handlers registered for a topic.
    pub fn handler_count(&self, topic: Topic) -> usize {
        self.handlers
            .read()
            .get(&topic)
            .map(|list| list.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn event(topic: Topic) -> PushEvent {
        PushEvent::lifecycle(topic)
    }

    #[test]
    fn test_emit_reaches_all_handlers_for_topic() {
        let dispatcher = Dispatcher::new();
        let count = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let count = count.clone();
            dispatcher.on(Topic::MarketData, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        dispatcher.on(Topic::ChartData, |_| panic!("wrong topic"));

        dispatcher.emit(&event(Topic::MarketData));
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_off_removes_only_the_given_handler() {
        let dispatcher = Dispatcher::new();
        let count = Arc::new(AtomicU32::new(0));

        let count_a = count.clone();
        let id_a = dispatcher.on(Topic::Update, move |_| {
            count_a.fetch_add(1, Ordering::SeqCst);
        });
        let count_b = count.clone();
        let _id_b = dispatcher.on(Topic::Update, move |_| {
            count_b.fetch_add(10, Ordering::SeqCst);
        });

        assert!(dispatcher.off(Topic::Update, id_a));
        dispatcher.emit(&event(Topic::Update));
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_off_unknown_id_is_noop() {
        let dispatcher = Dispatcher::new();
        let id = dispatcher.on(Topic::MarketData, |_| {});
        // Wrong topic, unknown id: both no-ops.
        assert!(!dispatcher.off(Topic::ChartData, id));
        assert!(dispatcher.off(Topic::MarketData, id));
        assert!(!dispatcher.off(Topic::MarketData, id));
    }

    #[test]
    fn test_handler_may_unsubscribe_itself_during_dispatch() {
        let dispatcher = Arc::new(Dispatcher::new());
        let inner = dispatcher.clone();
        let slot: Arc<RwLock<Option<HandlerId>>> = Arc::new(RwLock::new(None));
        let slot_inner = slot.clone();

        let id = dispatcher.on(Topic::MarketData, move |_| {
            if let Some(id) = *slot_inner.read() {
                inner.off(Topic::MarketData, id);
            }
        });
        *slot.write() = Some(id);

        dispatcher.emit(&event(Topic::MarketData));
        assert_eq!(dispatcher.handler_count(Topic::MarketData), 0);
    }
}
