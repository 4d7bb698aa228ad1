//! Category-keyed listener registry.
//!
//! Listeners are either synchronous callbacks or unbounded channels. `emit`
//! snapshots the listener set before invoking anything, so a callback may
//! register further listeners without deadlocking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::events::GatewayEvent;
use crate::router::EventCategory;

type Callback = Arc<dyn Fn(&GatewayEvent) + Send + Sync>;

#[derive(Clone)]
enum Listener {
    Callback(Callback),
    Channel(mpsc::UnboundedSender<GatewayEvent>),
}

impl Listener {
    fn is_alive(&self) -> bool {
        match self {
            Self::Callback(_) => true,
            Self::Channel(tx) => !tx.is_closed(),
        }
    }
}

/// Maps each [`EventCategory`] to its listeners.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<HashMap<EventCategory, Vec<Listener>>>,
}

impl EventDispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for `category`.
    pub fn on<F>(&self, category: EventCategory, callback: F)
    where
        F: Fn(&GatewayEvent) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .entry(category)
            .or_default()
            .push(Listener::Callback(Arc::new(callback)));
    }

    /// Subscribe to `category` through a channel.
    ///
    /// Dropping the receiver unsubscribes; the sender is pruned on the next
    /// emit to that category.
    #[must_use]
    pub fn subscribe(&self, category: EventCategory) -> mpsc::UnboundedReceiver<GatewayEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners
            .write()
            .entry(category)
            .or_default()
            .push(Listener::Channel(tx));
        rx
    }

    /// Remove every listener of `category`.
    pub fn clear(&self, category: EventCategory) {
        self.listeners.write().remove(&category);
    }

    /// Number of live listeners for `category`.
    #[must_use]
    pub fn listener_count(&self, category: EventCategory) -> usize {
        self.listeners
            .read()
            .get(&category)
            .map_or(0, |list| list.iter().filter(|l| l.is_alive()).count())
    }

    /// Deliver `payload` to every listener of `category`.
    ///
    /// Returns how many listeners received it.
    pub fn emit(&self, category: EventCategory, payload: &GatewayEvent) -> usize {
        let snapshot = {
            let mut listeners = self.listeners.write();
            let Some(list) = listeners.get_mut(&category) else {
                return 0;
            };
            list.retain(Listener::is_alive);
            list.clone()
        };

        let mut delivered = 0;
        for listener in snapshot {
            match listener {
                Listener::Callback(callback) => {
                    callback(payload);
                    delivered += 1;
                }
                Listener::Channel(tx) => {
                    if tx.send(payload.clone()).is_ok() {
                        delivered += 1;
                    }
                }
            }
        }
        delivered
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.read();
        let mut map = f.debug_map();
        for (category, list) in listeners.iter() {
            map.entry(&category.name(), &list.len());
        }
        map.finish()
    }
}
