//! Supersocket peer
//!
//! Starts a registry named `--name`, makes it discoverable, discovers
//! `--peer`, sends it one message and waits for one message back. Run two
//! peers pointing at each other:
//!
//! ```text
//! supersocket-peer --name Alice --peer Bob --message "hi bob"
//! supersocket-peer --name Bob --peer Alice --message "hi alice"
//! ```

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use clap::Parser;
use supersocket_core::{
    DiscoveryConfig, Registry,
    config::{DEFAULT_LOCAL_DIR, DISCOVERY_PORT},
    discover, spawn_listener,
};
use supersocket_proto::{Message, MessageBuffer, Name, ProtocolError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Supersocket peer
#[derive(Parser, Debug)]
#[command(name = "supersocket-peer")]
#[command(about = "Discover a process by name and exchange one message")]
struct Args {
    /// Name of this process
    #[arg(long)]
    name: String,

    /// Name of the process to reach
    #[arg(long)]
    peer: String,

    /// Address for the internet endpoint
    #[arg(long, default_value = "127.0.0.1")]
    address: Ipv4Addr,

    /// Port for the internet endpoint (0 picks one)
    #[arg(long, default_value_t = 0)]
    port: u16,

    /// Discovery multicast group
    #[arg(long, default_value = "239.0.0.1")]
    group: Ipv4Addr,

    /// Discovery multicast port
    #[arg(long, default_value_t = DISCOVERY_PORT)]
    group_port: u16,

    /// Directory for local socket files
    #[arg(long, default_value = DEFAULT_LOCAL_DIR)]
    local_dir: PathBuf,

    /// Payload to send
    #[arg(long, default_value = "hello")]
    message: String,

    /// Kind tag of the sent message
    #[arg(long, default_value_t = 1)]
    kind: u8,

    /// Seconds to wait for discovery and for the reply
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Error)]
enum PeerError {
    #[error(transparent)]
    Core(#[from] supersocket_core::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("no message received within {0:?}")]
    Timeout(Duration),
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "peer failed");
            ExitCode::FAILURE
        },
    }
}

fn run(args: &Args) -> Result<(), PeerError> {
    let timeout = Duration::from_secs(args.timeout_secs);

    let registry = Arc::new(Registry::with_local_dir(&args.name, &args.local_dir)?);
    registry.add_default_endpoints(&args.address.to_string(), args.port)?;
    registry.log_summary();

    let config = DiscoveryConfig {
        group: SocketAddrV4::new(args.group, args.group_port),
        deadline: Some(timeout),
        ..DiscoveryConfig::default()
    };
    let cancel = CancellationToken::new();
    let listener = spawn_listener(Arc::clone(&registry), &config, &cancel)?;

    let result = exchange(args, &registry, &config, &cancel, timeout);

    listener.shutdown();
    registry.close();
    result
}

fn exchange(
    args: &Args,
    registry: &Registry,
    config: &DiscoveryConfig,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Result<(), PeerError> {
    let index = discover(registry, &args.peer, config, cancel)?;

    let outgoing =
        Message::new(Name::new(&args.name)?, args.kind, args.message.clone().into_bytes())?;
    registry.send_message(index, &outgoing)?;
    info!(peer = %args.peer, index, kind = args.kind, payload = %args.message, "sent");

    if registry.poll_bound(Some(timeout))? == 0 {
        return Err(PeerError::Timeout(timeout));
    }
    let mut buffer = MessageBuffer::default();
    let incoming = registry.receive_message(&mut buffer)?;
    let (sender, kind) = (*incoming.sender(), incoming.kind());
    let payload = incoming.into_payload();
    info!(%sender, kind, payload = %String::from_utf8_lossy(&payload), "received");
    Ok(())
}
