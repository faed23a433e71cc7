//! Searchgate entry point.
//!
//! Startup order: logging → config → metrics → server build → listener
//! bind → serve. Any startup error is fatal and reported before the
//! proxy accepts traffic.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use searchgate::config::{load_config, ProxyConfig};
use searchgate::http::HttpServer;
use searchgate::lifecycle::Shutdown;
use searchgate::net::tls;
use searchgate::observability::{logging, metrics};

#[derive(Debug, Parser)]
#[command(name = "searchgate", about = "Authorization-enforcing search proxy")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        nodes = config.nodes.len(),
        cooldown_secs = config.cluster.cooldown_secs,
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let bind_address: SocketAddr = config.listener.bind_address.parse()?;
    let tls_config = config.listener.tls.clone();
    let server = HttpServer::new(config)?;

    match tls_config {
        Some(tls_config) => {
            let rustls = tls::load_tls_config(
                tls_config.cert_path.as_ref(),
                tls_config.key_path.as_ref(),
            )
            .await?;
            server
                .run_tls(bind_address, rustls, shutdown.subscribe())
                .await?;
        }
        None => {
            let listener = TcpListener::bind(bind_address).await?;
            server.run(listener, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
