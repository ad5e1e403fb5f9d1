use chrono::Utc;

/// A published message routed through the broker.
///
/// The payload is forwarded to subscribers byte-for-byte; the timestamp is
/// stamped when the broker accepts the publish and only appears in logs.
#[derive(Debug, Clone)]
pub struct Message {
    pub topic: String,
    pub payload: String,
    pub timestamp: i64,
}

impl Message {
    /// Builds a message stamped with the current time in epoch milliseconds.
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}
