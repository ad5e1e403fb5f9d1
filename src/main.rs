//! CLI for topicast
//!
//! Subcommands:
//! - `tcp` / `udp`: run a broker on the configured address
//! - `publish`: send one PUBLISH command and exit
//! - `subscribe`: send a SUBSCRIBE command and print delivered payloads

use std::process;
use std::sync::{Arc, Mutex};

use clap::{Parser, ValueEnum};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tracing::{error, info};

use topicast::broker::{Broker, Limits};
use topicast::config::load_config;
use topicast::transport::{start_tcp_server, start_udp_server};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Transport {
    Tcp,
    Udp,
}

#[derive(Parser)]
#[command(name = "topicast")]
enum Command {
    /// Run the broker over TCP
    Tcp,
    /// Run the broker over UDP
    Udp,
    /// Send one message to a topic (useful for smoke tests)
    Publish {
        #[arg(long, value_enum, default_value_t = Transport::Tcp)]
        transport: Transport,
        /// Broker address to connect to
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,
        topic: String,
        payload: String,
    },
    /// Subscribe to a topic and print everything delivered until killed
    Subscribe {
        #[arg(long, value_enum, default_value_t = Transport::Tcp)]
        transport: Transport,
        /// Broker address to connect to
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,
        topic: String,
    },
}

#[tokio::main]
async fn main() {
    topicast::utils::logging::init("info");

    let cmd = Command::parse();

    let result = match cmd {
        Command::Tcp => run_broker(Transport::Tcp).await,
        Command::Udp => run_broker(Transport::Udp).await,
        Command::Publish {
            transport,
            addr,
            topic,
            payload,
        } => run_publish(transport, &addr, &topic, &payload).await,
        Command::Subscribe {
            transport,
            addr,
            topic,
        } => run_subscribe(transport, &addr, &topic).await,
    };

    if let Err(e) = result {
        error!("{e}");
        process::exit(1);
    }
}

async fn run_broker(transport: Transport) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let broker = Arc::new(Mutex::new(Broker::with_limits(Limits::from(&config.broker))));

    let server = async {
        match transport {
            Transport::Tcp => start_tcp_server(&addr, broker, config.clone()).await,
            Transport::Udp => start_udp_server(&addr, broker, config.clone()).await,
        }
    };

    tokio::select! {
        result = server => {
            result?;
            error!("Broker exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_publish(
    transport: Transport,
    addr: &str,
    topic: &str,
    payload: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let line = format!("PUBLISH {topic} {payload}\n");

    match transport {
        Transport::Tcp => {
            let mut stream = TcpStream::connect(addr).await?;
            stream.write_all(line.as_bytes()).await?;
            stream.shutdown().await?;
        }
        Transport::Udp => {
            let socket = UdpSocket::bind("0.0.0.0:0").await?;
            socket.send_to(line.as_bytes(), addr).await?;
        }
    }

    println!("published to {topic}");
    Ok(())
}

async fn run_subscribe(
    transport: Transport,
    addr: &str,
    topic: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let line = format!("SUBSCRIBE {topic}\n");
    let mut buf = vec![0u8; 1024];

    match transport {
        Transport::Tcp => {
            let mut stream = TcpStream::connect(addr).await?;
            stream.write_all(line.as_bytes()).await?;
            println!("subscribed to {topic}, waiting for messages...");

            loop {
                let n = stream.read(&mut buf).await?;
                if n == 0 {
                    println!("connection closed by broker");
                    break;
                }
                println!("{}", String::from_utf8_lossy(&buf[..n]));
            }
        }
        Transport::Udp => {
            let socket = UdpSocket::bind("0.0.0.0:0").await?;
            socket.send_to(line.as_bytes(), addr).await?;
            println!("subscribed to {topic}, waiting for messages...");

            loop {
                let (n, _) = socket.recv_from(&mut buf).await?;
                println!("{}", String::from_utf8_lossy(&buf[..n]));
            }
        }
    }

    Ok(())
}
