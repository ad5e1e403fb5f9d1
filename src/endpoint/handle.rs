use bytes::Bytes;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

pub type EndpointId = String;

/// A delivery target registered with the broker.
///
/// For stream transports this stands for one accepted connection; for
/// datagram transports, one remote address. Either way the broker only sees
/// an id and an outbound channel, so registry logic stays transport-agnostic.
#[derive(Debug)]
pub struct Endpoint {
    /// Unique identifier for the endpoint (e.g. connection id or peer address).
    pub id: EndpointId,

    /// Channel carrying published payload bytes out to the endpoint.
    pub sender: UnboundedSender<Bytes>,
}

impl Endpoint {
    /// Creates an endpoint with a freshly minted connection id.
    pub fn new(sender: UnboundedSender<Bytes>) -> Self {
        Self {
            id: format!("conn-{}", Uuid::new_v4()),
            sender,
        }
    }

    /// Creates an endpoint with a caller-chosen identity, used by datagram
    /// transports where the remote address identifies the subscriber.
    pub fn with_id(id: impl Into<EndpointId>, sender: UnboundedSender<Bytes>) -> Self {
        Self {
            id: id.into(),
            sender,
        }
    }
}
