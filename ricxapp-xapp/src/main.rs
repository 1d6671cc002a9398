//! ricxapp - near-RT RIC xApp
//!
//! Runs the E2 message-plane core against a UDP RMR endpoint:
//! - CLI argument parsing
//! - Configuration loading and validation
//! - Task spawning, subscription restore and startup subscriptions
//! - Graceful shutdown handling
//!
//! # Usage
//!
//! ```bash
//! ricxapp -c config/xapp.yaml
//! ```

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ricxapp_common::{init_logging_with_filter, XappConfig};
use ricxapp_rmr::UdpRmrEndpoint;
use tokio::signal;
use tracing::{error, info, warn};

use ricxapp_xapp::{
    load_and_validate_xapp_config, startup_intent, JsonFileStore, LoggingSink, SubscriptionStore,
    Xapp,
};

/// ricxapp - near-RT RIC xApp
#[derive(Parser, Debug)]
#[command(name = "ricxapp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the xApp configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config_file: String,

    /// Log filter, overrides `log_level` from the configuration
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL")]
    log_level: Option<String>,

    /// RMR listen address, overrides `rmr.listen_addr`
    #[arg(long = "listen", value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Load and validate the configuration, then exit
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ricxapp: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_logging_with_filter(args.log_level.as_deref().unwrap_or(&config.log_level));

    if args.dry_run {
        info!(
            "Configuration {} is valid: {} startup subscription(s)",
            args.config_file,
            config.startup_subscriptions.len()
        );
        return ExitCode::SUCCESS;
    }

    match run_xapp(config).await {
        Ok(()) => {
            info!("ricxapp exited successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("ricxapp failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<XappConfig> {
    let mut config = load_and_validate_xapp_config(&args.config_file)
        .with_context(|| format!("Failed to load configuration from {}", args.config_file))?;
    if let Some(listen) = args.listen {
        config.rmr.listen_addr = listen;
    }
    Ok(config)
}

/// Main xApp execution logic
async fn run_xapp(config: XappConfig) -> Result<()> {
    info!(
        "Starting {} (requestor id {}) on {}",
        config.xapp_name, config.subscription.requestor_id, config.rmr.listen_addr
    );

    let transport = UdpRmrEndpoint::bind(&config.rmr)
        .await
        .with_context(|| format!("Failed to bind RMR endpoint {}", config.rmr.listen_addr))?;

    let store: Option<Box<dyn SubscriptionStore>> = match &config.store {
        Some(store_config) => {
            let store = JsonFileStore::open(&store_config.path).with_context(|| {
                format!("Failed to open subscription store {}", store_config.path.display())
            })?;
            Some(Box::new(store))
        }
        None => None,
    };

    let startup = config.startup_subscriptions.clone();
    let xapp = Xapp::start(config, Arc::new(transport), Arc::new(LoggingSink), store);

    match xapp.restore() {
        Ok(0) => {}
        Ok(n) => info!("Took over {} persisted subscription(s)", n),
        Err(e) => warn!("Failed to restore subscriptions: {}", e),
    }

    for entry in &startup {
        let intent = startup_intent(entry).context("Invalid startup subscription")?;
        let e2_node = intent.e2_node.clone();
        let ran_function_id = intent.ran_function_id;
        match xapp.subscribe(intent).await {
            Ok(id) => info!(subscription = %id, "Startup subscription requested"),
            Err(e) => warn!(
                e2_node = %e2_node,
                ran_function_id,
                "Startup subscription failed: {}", e
            ),
        }
    }

    info!("xApp running, waiting for shutdown signal...");
    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Received Ctrl+C, initiating shutdown...");

    if let Err(e) = xapp.shutdown().await {
        warn!("Some tasks failed during shutdown: {}", e);
    }
    Ok(())
}
