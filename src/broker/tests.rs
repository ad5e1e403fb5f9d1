use bytes::Bytes;
use tokio::sync::mpsc;

use super::engine::{Broker, DeliveryReport, Limits};
use super::error::RegistryError;
use super::message::Message;
use super::topic::Topic;
use crate::endpoint::Endpoint;

fn test_endpoint() -> (Endpoint, mpsc::UnboundedReceiver<Bytes>) {
    let (tx, rx) = mpsc::unbounded_channel::<Bytes>();
    (Endpoint::new(tx), rx)
}

#[test]
fn test_topic_new() {
    let topic = Topic::new("test_topic");
    assert_eq!(topic.name, "test_topic");
    assert!(topic.subscribers.is_empty());
}

#[test]
fn test_topic_subscribe_preserves_order() {
    let mut topic = Topic::new("test_topic");
    assert!(topic.subscribe("client1".to_string()));
    assert!(topic.subscribe("client2".to_string()));
    assert!(topic.subscribe("client3".to_string()));
    assert_eq!(topic.subscribers, vec!["client1", "client2", "client3"]);
}

#[test]
fn test_topic_subscribe_dedupes() {
    let mut topic = Topic::new("test_topic");
    assert!(topic.subscribe("client1".to_string()));
    assert!(!topic.subscribe("client1".to_string()));
    assert_eq!(topic.subscribers.len(), 1);
}

#[test]
fn test_topic_unsubscribe() {
    let mut topic = Topic::new("test_topic");
    topic.subscribe("client1".to_string());
    topic.subscribe("client2".to_string());
    topic.unsubscribe(&"client1".to_string());
    assert_eq!(topic.subscribers, vec!["client2"]);
}

#[test]
fn test_broker_new() {
    let broker = Broker::new();
    assert!(broker.topics.is_empty());
    assert!(broker.endpoints.is_empty());
}

#[test]
fn test_broker_register_and_remove_endpoint() {
    let mut broker = Broker::new();
    let (endpoint, _rx) = test_endpoint();
    let endpoint_id = endpoint.id.clone();

    broker.register_endpoint(endpoint);
    assert!(broker.contains_endpoint(&endpoint_id));
    assert_eq!(broker.endpoint_count(), 1);

    broker.remove_endpoint(&endpoint_id);
    assert!(!broker.contains_endpoint(&endpoint_id));
}

#[test]
fn test_broker_subscribe_creates_topic() {
    let mut broker = Broker::new();
    let (endpoint, _rx) = test_endpoint();
    let endpoint_id = endpoint.id.clone();
    broker.register_endpoint(endpoint);

    broker.subscribe("test_topic", endpoint_id.clone()).unwrap();
    assert!(broker.topics.contains_key("test_topic"));
    let topic = broker.topics.get("test_topic").unwrap();
    assert_eq!(topic.subscribers, vec![endpoint_id.clone()]);

    broker.unsubscribe("test_topic", &endpoint_id);
    let topic = broker.topics.get("test_topic").unwrap();
    assert!(topic.subscribers.is_empty());
}

#[test]
fn test_broker_subscribe_is_idempotent() {
    let mut broker = Broker::new();
    let (endpoint, mut rx) = test_endpoint();
    let endpoint_id = endpoint.id.clone();
    broker.register_endpoint(endpoint);

    broker.subscribe("test_topic", endpoint_id.clone()).unwrap();
    broker.subscribe("test_topic", endpoint_id.clone()).unwrap();
    assert_eq!(
        broker.topics.get("test_topic").unwrap().subscribers.len(),
        1
    );

    // one membership entry means exactly one delivery
    let report = broker.publish(&Message::new("test_topic", "hello"));
    assert_eq!(report.delivered, 1);
    assert_eq!(&rx.try_recv().unwrap()[..], b"hello");
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_broker_subscribe_rejects_long_topic_name() {
    let mut broker = Broker::with_limits(Limits {
        max_topics: 50,
        max_subscribers_per_topic: 50,
        max_topic_len: 8,
    });
    let (endpoint, _rx) = test_endpoint();
    let endpoint_id = endpoint.id.clone();
    broker.register_endpoint(endpoint);

    let err = broker
        .subscribe("much_too_long_topic", endpoint_id)
        .unwrap_err();
    assert_eq!(err, RegistryError::NameTooLong { limit: 8 });
    assert!(broker.topics.is_empty());
}

#[test]
fn test_broker_subscribe_topic_limit() {
    let mut broker = Broker::with_limits(Limits {
        max_topics: 1,
        max_subscribers_per_topic: 50,
        max_topic_len: 64,
    });
    let (endpoint, _rx) = test_endpoint();
    let endpoint_id = endpoint.id.clone();
    broker.register_endpoint(endpoint);

    broker.subscribe("first", endpoint_id.clone()).unwrap();
    let err = broker.subscribe("second", endpoint_id.clone()).unwrap_err();
    assert_eq!(err, RegistryError::TooManyTopics { limit: 1 });

    // existing topics still accept subscriptions
    broker.subscribe("first", endpoint_id).unwrap();
    assert_eq!(broker.topics.len(), 1);
}

#[test]
fn test_broker_subscribe_capacity_limit() {
    let mut broker = Broker::with_limits(Limits {
        max_topics: 50,
        max_subscribers_per_topic: 2,
        max_topic_len: 64,
    });
    let (first, _rx1) = test_endpoint();
    let (second, _rx2) = test_endpoint();
    let (third, _rx3) = test_endpoint();
    let first_id = first.id.clone();
    let second_id = second.id.clone();
    let third_id = third.id.clone();
    broker.register_endpoint(first);
    broker.register_endpoint(second);
    broker.register_endpoint(third);

    broker.subscribe("test_topic", first_id.clone()).unwrap();
    broker.subscribe("test_topic", second_id.clone()).unwrap();

    let err = broker.subscribe("test_topic", third_id).unwrap_err();
    assert_eq!(
        err,
        RegistryError::CapacityExceeded {
            topic: "test_topic".to_string(),
            limit: 2
        }
    );

    // the existing subscribers are untouched
    let topic = broker.topics.get("test_topic").unwrap();
    assert_eq!(topic.subscribers, vec![first_id, second_id]);
}

#[test]
fn test_broker_publish_delivers_payload_bytes() {
    let mut broker = Broker::new();
    let (endpoint, mut rx) = test_endpoint();
    let endpoint_id = endpoint.id.clone();
    broker.register_endpoint(endpoint);
    broker.subscribe("scores", endpoint_id).unwrap();

    let report = broker.publish(&Message::new("scores", "3-1"));
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 0);

    // payload only, command stripped, no added framing
    assert_eq!(&rx.try_recv().unwrap()[..], b"3-1");
}

#[test]
fn test_broker_publish_reaches_all_subscribers_in_order() {
    let mut broker = Broker::new();
    let mut receivers = Vec::new();
    let mut ids = Vec::new();
    for _ in 0..3 {
        let (endpoint, rx) = test_endpoint();
        ids.push(endpoint.id.clone());
        broker.register_endpoint(endpoint);
        receivers.push(rx);
    }
    for id in &ids {
        broker.subscribe("test_topic", id.clone()).unwrap();
    }

    // fan-out iterates the subscriber list in subscription order
    assert_eq!(broker.topics.get("test_topic").unwrap().subscribers, ids);

    let report = broker.publish(&Message::new("test_topic", "hi"));
    assert_eq!(report.delivered, 3);
    for rx in &mut receivers {
        assert_eq!(&rx.try_recv().unwrap()[..], b"hi");
    }
}

#[test]
fn test_publish_to_nonexistent_topic_is_not_an_error() {
    let broker = Broker::new();
    let report = broker.publish(&Message::new("nonexistent_topic", "hello"));
    assert_eq!(report, DeliveryReport::default());
    assert_eq!(report.recipients(), 0);
}

#[test]
fn test_publish_to_endpoint_with_closed_channel() {
    let mut broker = Broker::new();
    let (alive, mut alive_rx) = test_endpoint();
    let (dead, dead_rx) = test_endpoint();
    let alive_id = alive.id.clone();
    let dead_id = dead.id.clone();
    broker.register_endpoint(dead);
    broker.register_endpoint(alive);
    broker.subscribe("test_topic", dead_id).unwrap();
    broker.subscribe("test_topic", alive_id).unwrap();

    // Drop the receiver to close the channel
    drop(dead_rx);

    let report = broker.publish(&Message::new("test_topic", "hello"));
    assert_eq!(report.failed, 1);
    assert_eq!(report.delivered, 1);
    assert_eq!(&alive_rx.try_recv().unwrap()[..], b"hello");
}

#[test]
fn test_broker_cleanup_endpoint() {
    let mut broker = Broker::new();
    let (endpoint, _rx) = test_endpoint();
    let (other, mut other_rx) = test_endpoint();
    let endpoint_id = endpoint.id.clone();
    let other_id = other.id.clone();
    broker.register_endpoint(endpoint);
    broker.register_endpoint(other);
    broker.subscribe("a", endpoint_id.clone()).unwrap();
    broker.subscribe("b", endpoint_id.clone()).unwrap();
    broker.subscribe("a", other_id).unwrap();

    broker.cleanup_endpoint(&endpoint_id);
    assert!(!broker.contains_endpoint(&endpoint_id));
    for topic in broker.topics.values() {
        assert!(!topic.subscribers.contains(&endpoint_id));
    }

    // a cleaned-up endpoint is never again a delivery target
    let report = broker.publish(&Message::new("a", "after"));
    assert_eq!(report.delivered, 1);
    assert_eq!(&other_rx.try_recv().unwrap()[..], b"after");
}
