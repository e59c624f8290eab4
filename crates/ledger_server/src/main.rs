//! SPV Ledger Server
//!
//! REST API server and scheduler host for the SPV investment ledger.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ledger_scheduler::{PayoutScheduler, SipScheduler};
use ledger_server::config::{build_config, CliArgs as ConfigCliArgs};
use ledger_server::routes::AppState;
use ledger_server::server::Server;
use ledger_store::MemoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// SPV Ledger Server - REST API for share issuance and payouts
#[derive(Parser, Debug)]
#[command(name = "ledger_server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host address to bind to
    #[arg(long, env = "LEDGER_SERVER_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "LEDGER_SERVER_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LEDGER_LOG_LEVEL")]
    log_level: Option<String>,
}

impl From<Args> for ConfigCliArgs {
    fn from(args: Args) -> Self {
        ConfigCliArgs {
            config_file: args.config,
            host: args.host,
            port: args.port,
            log_level: args.log_level,
        }
    }
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cli_args: ConfigCliArgs = args.into();
    let config = build_config(&cli_args)?;

    // Initialize tracing
    init_tracing(config.log_level.as_filter_str());

    tracing::info!("SPV Ledger Server v{}", ledger_server::VERSION);
    tracing::info!(
        host = %config.host,
        port = %config.port,
        log_level = %config.log_level,
        environment = %config.environment,
        schedulers_enabled = %config.schedulers_enabled,
        sip_poll_interval_secs = %config.sip_poll_interval_secs,
        payout_poll_interval_secs = %config.payout_poll_interval_secs,
        "Server configuration loaded"
    );

    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(Arc::new(config), store.clone());

    // Background schedulers share the store with the HTTP surface
    if state.config.schedulers_enabled {
        let sip = SipScheduler::new(
            store.clone(),
            state.notifier.clone(),
            state.config.sip_poll_interval(),
        );
        tokio::spawn(async move { sip.run().await });

        let payouts = PayoutScheduler::new(
            store,
            state.notifier.clone(),
            state.config.payout_poll_interval(),
        );
        tokio::spawn(async move { payouts.run().await });

        tracing::info!("Contribution and payout schedulers started");
    }

    // Create and start the server
    let server = Server::new(state);
    tracing::info!(address = %server.socket_addr(), "Starting server");

    server.run().await?;

    Ok(())
}
