//! Subscriber registry for project store notifications.
//!
//! Each store owns its own bus; there is no global instance, so independent
//! stores (and tests) never see each other's events.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{EventCategory, ProjectEvent};

/// Subscription handle for unsubscribing from events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Filter to receive only specific event types
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Receive all events.
    #[default]
    All,
    /// Receive events matching any of these categories.
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    /// Check if an event matches this filter
    pub fn matches(&self, event: &ProjectEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

type EventHandler = Box<dyn Fn(&ProjectEvent) + Send + Sync>;

/// Synchronous handlers plus a broadcast channel for async listeners
pub struct EventBus {
    sender: broadcast::Sender<ProjectEvent>,
    handlers: Arc<RwLock<HashMap<SubscriptionId, (EventFilter, EventHandler)>>>,
}

impl EventBus {
    /// Create a bus whose broadcast channel buffers `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Deliver an event to every matching handler and broadcast receiver
    ///
    /// Returns the number of synchronous handlers that were called.
    pub fn publish(&self, event: ProjectEvent) -> usize {
        tracing::trace!("project event: {}", event);

        let handlers = self.handlers.read();
        let mut delivered = 0;
        for (filter, handler) in handlers.values() {
            if filter.matches(&event) {
                handler(&event);
                delivered += 1;
            }
        }
        drop(handlers);

        // No receivers is the normal case for a store nobody polls.
        let _ = self.sender.send(event);
        delivered
    }

    /// Subscribe with a synchronous handler
    ///
    /// The handler runs on the mutating thread right after the change, so
    /// it must not call back into the store.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&ProjectEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.write().insert(id, (filter, Box::new(handler)));
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Get a receiver for polling events from an async task
    pub fn receiver(&self) -> broadcast::Receiver<ProjectEvent> {
        self.sender.subscribe()
    }

    /// Unsubscribe; returns true if the subscription existed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.handlers.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Number of synchronous subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
