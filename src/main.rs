//! Policy Gate - OPA-backed authorization gate
//!
//! Starts the gated HTTP listener on the configured host and port.

use clap::Parser;
use policy_gate::config::Settings;
use policy_gate::metrics::server::{MetricsServer, MetricsServerConfig};
use policy_gate::server::Server;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Policy Gate - delegates request authorization to Open Policy Agent
#[derive(Parser, Debug)]
#[command(name = "policy-gate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional configuration file (environment variables take precedence)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref())?;

    // Initialize logging
    let level = args
        .log_level
        .unwrap_or_else(|| if settings.debug { "debug" } else { "info" }.to_string());
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .init();

    info!("Starting {} v{}", settings.app_name, policy_gate::VERSION);
    info!("Decision endpoint: {}", settings.opa_server_url);

    let mut metrics_server = None;
    if let Some(config) = MetricsServerConfig::from_settings(&settings) {
        let mut server = MetricsServer::new(config);
        let addr = server.start().await?;
        info!("Metrics available at http://{}/metrics", addr);
        metrics_server = Some(server);
    }

    let server = Server::new(&settings).await?;
    server.run().await?;

    if let Some(mut server) = metrics_server {
        server.shutdown().await;
    }

    Ok(())
}
