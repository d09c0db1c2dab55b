//! Injective transaction relay.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client (POST /api/v1/execute)
//!         │
//!         ▼
//!   ┌───────────┐   ┌────────────┐   ┌──────────────┐   ┌───────────────┐
//!   │   http    │──▶│  dispatch  │──▶│   messages   │──▶│   pipeline    │
//!   │  server   │   │ fn → module│   │  Msg* → Any  │   │ session lock  │
//!   └───────────┘   └────────────┘   └──────────────┘   │ simulate/sign │
//!                                                       │ broadcast     │
//!                                                       └──────┬────────┘
//!                                                              │
//!                                                              ▼
//!                                                     ┌────────────────┐
//!                                                     │  blockchain    │──▶ LCD gateway
//!                                                     │ node client    │
//!                                                     └────────────────┘
//!
//!   Cross-cutting: config, observability, resilience, lifecycle
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use inj_relay::blockchain::{LcdNodeClient, NetworkKind, SigningIdentity};
use inj_relay::config::{load_config, RelayConfig};
use inj_relay::dispatch::FunctionRouter;
use inj_relay::http::{AppState, RelayServer};
use inj_relay::lifecycle::{wait_for_signal, Shutdown};
use inj_relay::messages::Modules;
use inj_relay::observability::{logging, metrics};
use inj_relay::pipeline::PipelineRegistry;

#[derive(Parser)]
#[command(name = "inj-relay")]
#[command(about = "Transaction relay for the Injective chain", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured network (mainnet | testnet).
    #[arg(short, long)]
    network: Option<NetworkKind>,

    /// Override the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(kind) = args.network {
        config.network.kind = kind;
    }
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "inj-relay starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let identity = SigningIdentity::from_env()?;
    let network = config.profile();
    tracing::info!(
        address = %identity.address(),
        chain_id = %network.chain_id,
        endpoint = %network.lcd_endpoint,
        "Signing identity loaded"
    );

    let node = LcdNodeClient::new(&network, config.node.rpc_timeout())?;
    let registry = PipelineRegistry::new(Arc::new(node), network)
        .with_settings(config.node.session_settings());
    let pipeline = registry.get_or_insert(identity);

    if let Err(e) = pipeline.ensure_session().await {
        // Not fatal: the first transaction retries the account fetch.
        tracing::warn!(error = %e, "Initial session sync failed");
    }

    let router = FunctionRouter::new(Modules::new(pipeline.clone()))
        .with_retry_policy(config.dispatch.retry_policy());
    let server = RelayServer::new(AppState::new(router, pipeline), &config.server);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
