//! UDP transport
//!
//! One non-connection-oriented socket. Each inbound datagram is a complete,
//! self-contained record tagged with its sender's address, which becomes the
//! endpoint identity for subscription purposes. Datagram endpoints are never
//! explicitly destroyed, only implicitly stale; their forwarder task exits
//! when sending back to the peer fails.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::broker::Broker;
use crate::config::Settings;
use crate::endpoint::{Endpoint, EndpointId};
use crate::transport::dispatch_record;

/// Binds `addr` and serves datagrams until the process is stopped.
pub async fn start_udp_server(
    addr: &str,
    broker: Arc<Mutex<Broker>>,
    settings: Settings,
) -> io::Result<()> {
    let socket = UdpSocket::bind(addr).await?;
    info!("UDP broker listening on {addr}");
    serve_udp(socket, broker, settings).await
}

/// Receive loop over an already-bound socket.
///
/// Transient receive errors (e.g. ICMP-triggered resets) are logged and the
/// loop continues; only bind failure is fatal.
pub async fn serve_udp(
    socket: UdpSocket,
    broker: Arc<Mutex<Broker>>,
    settings: Settings,
) -> io::Result<()> {
    let socket = Arc::new(socket);
    let mut buf = vec![0u8; settings.broker.read_buffer_bytes];

    loop {
        let (len, peer) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!("recv error: {e}");
                continue;
            }
        };

        let endpoint_id = ensure_endpoint(&broker, &socket, peer);

        // One command per datagram; tolerate a trailing newline from
        // line-oriented senders.
        let mut record = &buf[..len];
        while matches!(record.last(), Some(b'\n' | b'\r')) {
            record = &record[..record.len() - 1];
        }
        dispatch_record(&broker, &endpoint_id, record);
    }
}

/// Registers `peer` as an endpoint on first sight and spawns its forwarder
/// task; later datagrams from the same address reuse the registration.
fn ensure_endpoint(
    broker: &Arc<Mutex<Broker>>,
    socket: &Arc<UdpSocket>,
    peer: SocketAddr,
) -> EndpointId {
    let endpoint_id = format!("udp-{peer}");

    let mut broker_lock = broker.lock().unwrap();
    if broker_lock.contains_endpoint(&endpoint_id) {
        return endpoint_id;
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
    broker_lock.register_endpoint(Endpoint::with_id(endpoint_id.clone(), tx));
    drop(broker_lock);
    debug!("registered datagram endpoint {endpoint_id}");

    let socket = socket.clone();
    let id = endpoint_id.clone();
    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if let Err(e) = socket.send_to(&payload, peer).await {
                warn!("failed to forward to {id}: {e}");
                break;
            }
        }
        debug!("forwarder closed for {id}");
    });

    endpoint_id
}
