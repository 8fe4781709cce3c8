//! # sim_server
//!
//! Runs one simulated world.
//!
//! ## Startup Sequence
//!
//! 1. Load static data from `--data-dir`.
//! 2. Pick a transport: NATS when `--nats-url` or `NATS_URL` is given,
//!    otherwise an in-process channel whose packets are logged.
//! 3. Create the world (spawning its level entity) and enter the tick loop
//!    until `--max-ticks` is reached or Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sim_data::{GameData, StaticData};
use sim_net::connection::NATS_URL_ENV;
use sim_net::{ChannelTransport, NatsConnection, NatsTransport, Transport};
use sim_world::{TickLoop, World, WorldConfig};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sim_server", about = "Live-world simulation server")]
struct Args {
    /// Directory holding abilities.json, global_combat.json and items.json
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Target ticks per second
    #[arg(short, long, default_value_t = 20.0)]
    tick_rate: f64,

    /// Stop after this many ticks (0 = run until Ctrl-C)
    #[arg(short, long, default_value_t = 0)]
    max_ticks: u64,

    /// Spatial grid cells are 2^rank units on a side
    #[arg(short, long, default_value_t = 5)]
    spatial_rank: u32,

    /// NATS server URL; falls back to the NATS_URL environment variable
    #[arg(short, long)]
    nats_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sim_server=info,sim_world=info")),
        )
        .init();

    let args = Args::parse();
    info!(?args, "simulation server starting");

    let data = GameData::load_dir(&args.data_dir)
        .with_context(|| format!("loading static data from {}", args.data_dir.display()))?;
    let data: Arc<dyn StaticData> = Arc::new(data);

    let transport = build_transport(args.nats_url.as_deref()).await?;

    let config = WorldConfig::default()
        .with_spatial_rank(args.spatial_rank)
        .with_tick_rate(args.tick_rate)
        .with_max_ticks(args.max_ticks);
    let world = Arc::new(World::new(config, data).context("creating world")?);

    let mut tick_loop = TickLoop::new(world, transport);
    tick_loop
        .run_async(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!(ticks = tick_loop.tick_id(), "simulation server shut down");
    Ok(())
}

async fn build_transport(nats_url: Option<&str>) -> Result<Arc<dyn Transport>> {
    let connection = match nats_url {
        Some(url) => Some(NatsConnection::connect_to(url).await?),
        None if std::env::var_os(NATS_URL_ENV).is_some() => Some(NatsConnection::connect().await?),
        None => None,
    };

    if let Some(connection) = connection {
        return Ok(Arc::new(NatsTransport::new(connection)?));
    }

    info!("no NATS configured; notifies are logged only");
    let (transport, mut rx) = ChannelTransport::new();
    tokio::spawn(async move {
        while let Some((session, packet)) = rx.recv().await {
            debug!(%session, cmd_id = packet.cmd_id, bytes = packet.payload.len(), "notify");
        }
    });
    Ok(Arc::new(transport))
}
