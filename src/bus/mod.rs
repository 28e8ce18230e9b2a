//! Notification Channel
//!
//! Synchronous publish/subscribe router that decouples command producers
//! from storage and storage from output.
//!
//! ## Delivery Contract
//! - Handlers for a topic run in registration order
//! - `publish` runs every handler on the caller's thread and returns only
//!   after all of them (and anything they publish) have completed
//! - The first failing handler stops delivery for that publish and its
//!   error is returned to the publisher
//! - No ordering across topics beyond the causal order of publish calls

mod event;

pub use event::{topics, Event, Payload};

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;

/// A subscribed callback
///
/// The bus passes itself in so a handler can publish follow-up events
/// without owning a reference back to the bus.
pub type Handler = Arc<dyn Fn(&EventBus, &Event) -> Result<()> + Send + Sync>;

/// Publish/subscribe router
#[derive(Default)]
pub struct EventBus {
    /// Topic -> handlers in registration order
    subscribers: RwLock<HashMap<String, Vec<Handler>>>,
}

impl EventBus {
    /// Create a bus with no subscriptions
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F)
    where
        F: Fn(&EventBus, &Event) -> Result<()> + Send + Sync + 'static,
    {
        let topic = topic.into();
        tracing::trace!("Subscribing handler to {}", topic);
        self.subscribers
            .write()
            .entry(topic)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Deliver `event` to every handler of its topic
    pub fn publish(&self, event: Event) -> Result<()> {
        // Snapshot so handlers may publish or subscribe without holding the lock
        let handlers: Vec<Handler> = match self.subscribers.read().get(&event.topic) {
            Some(handlers) => handlers.clone(),
            None => return Ok(()),
        };

        tracing::trace!(
            "Publishing {} to {} handler(s)",
            event.topic,
            handlers.len()
        );

        for handler in handlers {
            handler(self, &event)?;
        }

        Ok(())
    }

    /// Number of handlers registered for `topic`
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers.read().get(topic).map_or(0, Vec::len)
    }

    /// Drop every subscription (session teardown)
    pub fn clear(&self) {
        self.subscribers.write().clear();
    }
}
