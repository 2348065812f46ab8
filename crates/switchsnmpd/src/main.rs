//! Switch Statistics SNMP Gateway
//!
//! Main entry point for the switchsnmpd daemon.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use switchsnmpd::{
    Gateway, GatewayConfig, GatewayError, HttpStatsFetcher, MetricsServer, Result, SnmpAgent,
    DEFAULT_CONFIG_PATH,
};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Scrape switch port statistics and serve them over SNMP v2c
#[derive(Parser, Debug)]
#[command(name = "switchsnmpd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Poll every switch once, print the object table and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level) {
        eprintln!("switchsnmpd: {}", e);
        return ExitCode::FAILURE;
    }

    let result = if args.once {
        run_once(&args).await
    } else {
        run_daemon(&args).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "switchsnmpd exiting with error");
            ExitCode::FAILURE
        }
    }
}

/// Initialize structured logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| GatewayError::Configuration(format!("Invalid log level '{}': {}", level, e)))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| GatewayError::Other(format!("Failed to set logger: {}", e)))
}

fn load_config(args: &Args) -> anyhow::Result<GatewayConfig> {
    let config = GatewayConfig::load(&args.config)?;
    config
        .validate()
        .with_context(|| format!("invalid configuration in {}", args.config.display()))?;
    info!(
        path = %args.config.display(),
        switches = config.switches.len(),
        "Configuration loaded"
    );
    Ok(config)
}

fn build_gateway(config: GatewayConfig) -> Result<Gateway> {
    let fetcher = HttpStatsFetcher::new(config.fetch_timeout())?;
    Gateway::new(config, Arc::new(fetcher))
}

async fn run_once(args: &Args) -> anyhow::Result<()> {
    let gateway = build_gateway(load_config(args)?)?;

    let failures = gateway.poll_all_once().await;
    if failures > 0 {
        warn!(failures, "Some switches could not be polled");
    }

    for object in gateway.responder().respond() {
        println!("{} = {}", object.path, object.value);
    }

    Ok(())
}

async fn run_daemon(args: &Args) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let snmp_listen = config.snmp_listen();
    let metrics_listen = config.metrics_listen;
    let gateway = build_gateway(config)?;

    let agent = SnmpAgent::bind(
        snmp_listen,
        &gateway.config().snmp_community,
        gateway.snmp_handler(),
    )
    .await?;

    let metrics_server = match metrics_listen {
        Some(addr) => Some(MetricsServer::bind(addr, gateway.metrics().clone()).await?),
        None => None,
    };

    info!("Starting switchsnmpd");

    let shutdown = CancellationToken::new();
    let tracker = TaskTracker::new();

    gateway.spawn_collectors(&tracker, &shutdown);
    tracker.spawn(agent.run(shutdown.clone()));

    if let Some(server) = metrics_server {
        let token = shutdown.clone();
        tracker.spawn(async move {
            if let Err(e) = server.run(token).await {
                error!(error = %e, "Metrics server failed");
            }
        });
    }
    tracker.close();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown requested");

    shutdown.cancel();
    tracker.wait().await;

    info!("switchsnmpd stopped");
    Ok(())
}
