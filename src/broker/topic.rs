//! Topic management
//!
//! A `Topic` holds the subscribers for a particular topic name, in the order
//! they subscribed — publish fan-out follows that order. Duplicate
//! subscriptions are a no-op.
//!
//! Concurrency note: callers must synchronize access to `Topic` (for example
//! via the broker lock) when modifying subscriptions.

use crate::endpoint::EndpointId;

#[derive(Debug, Default)]
pub struct Topic {
    pub name: String,
    pub subscribers: Vec<EndpointId>,
}

impl Topic {
    /// Create a new topic with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: Vec::new(),
        }
    }

    /// Add a subscriber to the topic, keeping subscription order. Returns
    /// `false` if the endpoint was already subscribed.
    pub fn subscribe(&mut self, id: EndpointId) -> bool {
        if self.subscribers.contains(&id) {
            return false;
        }
        self.subscribers.push(id);
        true
    }

    /// Remove a subscriber from the topic.
    pub fn unsubscribe(&mut self, id: &EndpointId) {
        self.subscribers.retain(|s| s != id);
    }
}
