//! Broker engine
//!
//! This module contains the in-memory registry implementation responsible for:
//! - managing topics and their subscriber lists
//! - fanning published payloads out to subscribers
//! - enforcing the configured topic and subscriber bounds
//!
//! Concurrency and usage notes:
//! - The public API here is synchronous and designed to be held behind a
//!   lock (for example `Arc<Mutex<Broker>>`) by the transport layer. Delivery
//!   goes through per-endpoint channels, so holding the lock for a publish
//!   never blocks on a slow peer's socket.

use std::collections::HashMap;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::broker::error::RegistryError;
use crate::broker::message::Message;
use crate::broker::topic::Topic;
use crate::config::{BrokerSettings, Settings};
use crate::endpoint::{Endpoint, EndpointId};

/// Registry bounds enforced when a subscription is added.
#[derive(Debug, Clone)]
pub struct Limits {
    pub max_topics: usize,
    pub max_subscribers_per_topic: usize,
    pub max_topic_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self::from(&Settings::default().broker)
    }
}

impl From<&BrokerSettings> for Limits {
    fn from(settings: &BrokerSettings) -> Self {
        Self {
            max_topics: settings.max_topics,
            max_subscribers_per_topic: settings.max_subscribers_per_topic,
            max_topic_len: settings.max_topic_len,
        }
    }
}

/// Outcome of one publish fan-out.
///
/// Publishing to a topic nobody has joined is normal and yields an empty
/// report. Partial failure is expected: a dead subscriber bumps `failed`
/// and the rest still receive the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryReport {
    pub fn recipients(&self) -> usize {
        self.delivered + self.failed
    }
}

#[derive(Debug, Default)]
pub struct Broker {
    pub topics: HashMap<String, Topic>,
    pub endpoints: HashMap<EndpointId, Endpoint>,
    limits: Limits,
}

impl Broker {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            topics: HashMap::new(),
            endpoints: HashMap::new(),
            limits,
        }
    }

    /// Registers a newly connected endpoint with the broker.
    pub fn register_endpoint(&mut self, endpoint: Endpoint) {
        self.endpoints.insert(endpoint.id.clone(), endpoint);
    }

    /// Removes an endpoint without touching its topic memberships. Use
    /// `cleanup_endpoint` on disconnect.
    pub fn remove_endpoint(&mut self, endpoint_id: &EndpointId) {
        self.endpoints.remove(endpoint_id);
    }

    pub fn contains_endpoint(&self, endpoint_id: &EndpointId) -> bool {
        self.endpoints.contains_key(endpoint_id)
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Subscribes an endpoint to a topic, creating the topic on first use.
    ///
    /// Re-subscribing the same endpoint is an idempotent no-op success.
    /// Capacity failures reject the request and leave the registry unchanged.
    pub fn subscribe(
        &mut self,
        topic: &str,
        subscriber: EndpointId,
    ) -> Result<(), RegistryError> {
        if topic.len() > self.limits.max_topic_len {
            return Err(RegistryError::NameTooLong {
                limit: self.limits.max_topic_len,
            });
        }

        if let Some(existing) = self.topics.get_mut(topic) {
            if existing.subscribers.contains(&subscriber) {
                debug!("{subscriber} already subscribed to {topic}");
                return Ok(());
            }
            if existing.subscribers.len() >= self.limits.max_subscribers_per_topic {
                return Err(RegistryError::CapacityExceeded {
                    topic: topic.to_string(),
                    limit: self.limits.max_subscribers_per_topic,
                });
            }
            existing.subscribe(subscriber);
            return Ok(());
        }

        if self.topics.len() >= self.limits.max_topics {
            return Err(RegistryError::TooManyTopics {
                limit: self.limits.max_topics,
            });
        }
        if self.limits.max_subscribers_per_topic == 0 {
            return Err(RegistryError::CapacityExceeded {
                topic: topic.to_string(),
                limit: 0,
            });
        }
        let mut created = Topic::new(topic);
        created.subscribe(subscriber);
        self.topics.insert(topic.to_string(), created);
        Ok(())
    }

    /// Unsubscribes an endpoint from a topic.
    /// If the topic does not exist, it will not perform any action.
    pub fn unsubscribe(&mut self, topic: &str, subscriber: &EndpointId) {
        if let Some(t) = self.topics.get_mut(topic) {
            t.unsubscribe(subscriber);
        }
    }

    /// Fans a published payload out to every subscriber of its topic, in
    /// subscription order.
    ///
    /// Delivery is best-effort: a failed send is counted and skipped, never
    /// propagated as a publish-wide error.
    pub fn publish(&self, msg: &Message) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        let Some(topic) = self.topics.get(&msg.topic) else {
            debug!("no subscribers for topic '{}'", msg.topic);
            return report;
        };

        debug!(
            "fan-out on '{}' to {} subscribers at {}",
            topic.name,
            topic.subscribers.len(),
            msg.timestamp
        );

        let payload = Bytes::from(msg.payload.clone());
        for sub_id in &topic.subscribers {
            match self.endpoints.get(sub_id) {
                Some(endpoint) => {
                    if let Err(e) = endpoint.sender.send(payload.clone()) {
                        warn!("failed to deliver to {sub_id}: {e}");
                        report.failed += 1;
                    } else {
                        report.delivered += 1;
                    }
                }
                None => {
                    warn!("no endpoint registered with id: {sub_id}");
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Cleans up an endpoint by removing it and unsubscribing it from all
    /// topics. Called on disconnect so a closed connection is never again a
    /// delivery target.
    pub fn cleanup_endpoint(&mut self, endpoint_id: &EndpointId) {
        self.remove_endpoint(endpoint_id);

        for topic in self.topics.values_mut() {
            topic.unsubscribe(endpoint_id);
        }

        debug!("cleaned up endpoint {endpoint_id}");
    }
}
