//! The `transport` module is responsible for network communication with
//! clients over plain TCP and UDP.
//!
//! Both transports feed framed records through the same dispatch path into
//! the broker; they differ only in how records are framed (newline-delimited
//! stream vs. one command per datagram) and how endpoints are identified
//! (connection vs. sender address).

pub mod tcp;
pub mod udp;

pub use tcp::start_tcp_server;
pub use udp::start_udp_server;


use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::broker::Broker;
use crate::broker::message::Message;
use crate::endpoint::EndpointId;
use crate::protocol::Command;

/// Applies one framed record to the broker on behalf of an endpoint.
///
/// Protocol and capacity failures are logged and discarded; the caller's
/// connection stays open and no error frame is sent back.
pub(crate) fn dispatch_record(
    broker: &Arc<Mutex<Broker>>,
    endpoint_id: &EndpointId,
    record: &[u8],
) {
    match Command::parse(record) {
        Ok(Command::Subscribe { topic }) => {
            let mut broker = broker.lock().unwrap();
            match broker.subscribe(&topic, endpoint_id.clone()) {
                Ok(()) => info!("{endpoint_id} subscribed to {topic}"),
                Err(e) => warn!("rejected subscription to {topic} from {endpoint_id}: {e}"),
            }
        }
        Ok(Command::Publish { topic, payload }) => {
            let broker = broker.lock().unwrap();
            let report = broker.publish(&Message::new(topic.clone(), payload));
            info!(
                "{endpoint_id} published to {topic}: {} delivered, {} failed",
                report.delivered, report.failed
            );
        }
        Err(err) => {
            warn!(
                "invalid command from {endpoint_id}: {err} | {}",
                String::from_utf8_lossy(record)
                    .chars()
                    .take(100)
                    .collect::<String>()
            );
        }
    }
}
