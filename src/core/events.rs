//! Application event bus
//!
//! A small synchronous broadcast: named events fan out to registered
//! callbacks. Subscriptions are scoped handles that unsubscribe on drop, so
//! observer removal is deterministic instead of a deallocation side effect.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};
use uuid::Uuid;

/// Events the coordinator and its collaborators exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The persisted pause flag changed. Carries no payload; listeners read
    /// the current value from the store so bursts of toggles coalesce to
    /// the final state.
    PauseChanged,
    /// The user clicked a delivered notification.
    NotificationClick { url: Option<String> },
}

type Callback = Box<dyn Fn(&AppEvent) + Send + Sync>;
type CallbackMap = HashMap<Uuid, Callback>;

/// Synchronous pub/sub hub.
pub struct EventBus {
    callbacks: Arc<RwLock<CallbackMap>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            callbacks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a callback. It runs for every event until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        if let Ok(mut map) = self.callbacks.write() {
            map.insert(id, Box::new(callback));
        }
        Subscription {
            id,
            callbacks: Arc::downgrade(&self.callbacks),
        }
    }

    /// Deliver an event to every live subscriber, on the caller's thread.
    pub fn emit(&self, event: &AppEvent) {
        if let Ok(map) = self.callbacks.read() {
            for callback in map.values() {
                callback(event);
            }
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.callbacks.read().map(|m| m.len()).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle tying a callback's lifetime to a scope. Dropping it removes the
/// callback from the bus.
pub struct Subscription {
    id: Uuid,
    callbacks: Weak<RwLock<CallbackMap>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(callbacks) = self.callbacks.upgrade() {
            if let Ok(mut map) = callbacks.write() {
                map.remove(&self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_emit_reaches_all_subscribers() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c1 = count.clone();
        let _s1 = bus.subscribe(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = count.clone();
        let _s2 = bus.subscribe(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&AppEvent::PauseChanged);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        let sub = bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit(&AppEvent::PauseChanged);
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);

        bus.emit(&AppEvent::PauseChanged);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_payload_delivery() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        let _sub = bus.subscribe(move |event| {
            if let AppEvent::NotificationClick { url } = event {
                seen_clone.lock().unwrap().push(url.clone());
            }
        });

        bus.emit(&AppEvent::NotificationClick {
            url: Some("https://example.com/release".to_string()),
        });
        bus.emit(&AppEvent::NotificationClick { url: None });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].as_deref(), Some("https://example.com/release"));
        assert_eq!(seen[1], None);
    }
}
