//! Nearcast CLI entry point.
//!
//! Wires the in-memory discovery and transfer services into a [`Dispatcher`]
//! and drives it against a set of simulated peers until Ctrl-C.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use eyre::{Result, WrapErr};
use nearcast_discovery::MemoryDiscovery;
use nearcast_dispatch::{Dispatcher, DispatcherConfig};
use nearcast_primitives::Peer;
use nearcast_transfer::{signal_channel, MemoryTransfer};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Nearcast - repeatedly offers a file to every peer in proximity
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct NearcastCli {
    /// File offered to every approved peer.
    pub payload: PathBuf,

    /// Cool-down in seconds before a peer is approached again after its
    /// operation ended.
    #[arg(long, default_value_t = 15)]
    pub recharge_secs: u64,

    /// Seconds a simulated send operation takes to finish.
    #[arg(long, default_value_t = 3)]
    pub transfer_secs: u64,

    /// Display name of a simulated peer to announce at startup. Repeatable.
    #[arg(long = "peer", value_name = "NAME")]
    pub peers: Vec<String>,

    /// Tracing filter directives, e.g. `info,nearcast_dispatch=trace`.
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}

impl NearcastCli {
    /// Install the global tracing subscriber.
    pub fn init_tracing(&self) -> Result<()> {
        let filter = EnvFilter::try_new(&self.log_filter)
            .wrap_err_with(|| format!("invalid log filter: {}", self.log_filter))?;
        tracing_subscriber::fmt().with_env_filter(filter).init();
        Ok(())
    }

    fn simulated_peers(&self) -> Vec<Peer> {
        let names: Vec<&str> = if self.peers.is_empty() {
            vec!["living-room", "kitchen"]
        } else {
            self.peers.iter().map(String::as_str).collect()
        };
        names
            .into_iter()
            .map(|name| Peer::new(format!("sim-{name}"), name))
            .collect()
    }
}

/// Run the dispatcher until Ctrl-C.
pub async fn run(args: NearcastCli) -> Result<()> {
    if !args.payload.is_file() {
        eyre::bail!("payload {} is not a readable file", args.payload.display());
    }

    let discovery = MemoryDiscovery::new();
    let (signal_tx, signal_rx) = signal_channel();
    let transfer =
        MemoryTransfer::auto_completing(signal_tx, Duration::from_secs(args.transfer_secs));

    let mut config = DispatcherConfig::new(args.payload.clone());
    config.recharge = Duration::from_secs(args.recharge_secs);

    let mut dispatcher = Dispatcher::new(discovery.clone(), transfer, config, signal_rx);
    dispatcher.start();

    let peers = args.simulated_peers();
    info!(count = peers.len(), "announcing simulated peers");
    discovery.announce(peers);

    dispatcher
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await;

    Ok(())
}
