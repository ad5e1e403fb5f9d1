//! TCP transport
//!
//! This file implements the stream side of the relay. Responsibilities:
//! - Accept TCP connections up to the configured connection ceiling
//! - Create an `Endpoint` for each connection and register it with the `Broker`
//! - Reassemble newline-framed records and forward them to the dispatch path
//! - Tear the endpoint down on EOF, read error, oversized record, or idle
//!   timeout, unsubscribing it from every topic exactly once
//!
//! Each connection runs a reader loop plus a writer task draining the
//! endpoint's outbound channel, so a slow receiver never stalls the broker.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::broker::Broker;
use crate::config::Settings;
use crate::endpoint::Endpoint;
use crate::protocol::LineFramer;
use crate::transport::dispatch_record;

/// Binds `addr` and serves connections until the process is stopped.
///
/// A bind failure is the only fatal error; everything after that is
/// contained per connection.
pub async fn start_tcp_server(
    addr: &str,
    broker: Arc<Mutex<Broker>>,
    settings: Settings,
) -> io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("TCP broker listening on {addr}");
    serve_tcp(listener, broker, settings).await
}

/// Accept loop over an already-bound listener.
///
/// Connections beyond `max_connections` are closed immediately after
/// accept.
pub async fn serve_tcp(
    listener: TcpListener,
    broker: Arc<Mutex<Broker>>,
    settings: Settings,
) -> io::Result<()> {
    let active = Arc::new(AtomicUsize::new(0));

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("failed to accept connection: {e}");
                continue;
            }
        };

        if active.load(Ordering::SeqCst) >= settings.broker.max_connections {
            warn!("connection ceiling reached, closing {peer}");
            drop(stream);
            continue;
        }
        active.fetch_add(1, Ordering::SeqCst);

        let broker = broker.clone();
        let settings = settings.clone();
        let active = active.clone();
        tokio::spawn(async move {
            handle_connection(stream, broker, settings).await;
            active.fetch_sub(1, Ordering::SeqCst);
        });
    }
}

async fn handle_connection(stream: TcpStream, broker: Arc<Mutex<Broker>>, settings: Settings) {
    let peer = stream.peer_addr().ok();
    let (mut reader, mut writer) = stream.into_split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
    let endpoint = Endpoint::new(tx);
    let endpoint_id = endpoint.id.clone();
    {
        let mut broker = broker.lock().unwrap();
        broker.register_endpoint(endpoint);
    }
    debug!("accepted {endpoint_id} from {peer:?}");

    let cleanup_called = Arc::new(AtomicBool::new(false));

    let do_cleanup = {
        let broker = broker.clone();
        let endpoint_id = endpoint_id.clone();
        let cleanup_called = cleanup_called.clone();

        move || {
            if !cleanup_called.swap(true, Ordering::SeqCst) {
                let mut broker = broker.lock().unwrap();
                broker.cleanup_endpoint(&endpoint_id);
            }
        }
    };

    // Forward published payloads from the broker to this connection.
    {
        let endpoint_id = endpoint_id.clone();
        let do_cleanup = do_cleanup.clone();

        tokio::spawn(async move {
            while let Some(payload) = rx.recv().await {
                if let Err(e) = writer.write_all(&payload).await {
                    warn!("failed to write to {endpoint_id}: {e}");
                    break;
                }
            }

            do_cleanup();
            debug!("send loop closed for {endpoint_id}");
        });
    }

    let idle = Duration::from_secs(settings.broker.idle_timeout_secs);
    let mut framer = LineFramer::new(settings.broker.read_buffer_bytes);
    let mut chunk = vec![0u8; settings.broker.read_buffer_bytes];

    loop {
        let read = match timeout(idle, reader.read(&mut chunk)).await {
            Ok(Ok(0)) => {
                debug!("{endpoint_id} disconnected");
                break;
            }
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                warn!("read error on {endpoint_id}: {e}");
                break;
            }
            Err(_) => {
                info!("closing idle connection {endpoint_id}");
                break;
            }
        };

        let records = match framer.push(&chunk[..read]) {
            Ok(records) => records,
            Err(e) => {
                warn!("closing {endpoint_id}: {e}");
                break;
            }
        };
        for record in records {
            dispatch_record(&broker, &endpoint_id, &record);
        }
    }

    do_cleanup();
}
