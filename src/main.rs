use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::Level;

use docroot::config::ServerConfig;
use docroot::server;

/// Concurrent HTTP/1.x file server
#[derive(Debug, Parser)]
#[command(name = "docroot", version)]
struct Cli {
    /// Configuration file
    #[arg(default_value = "httpd.conf", env = "HTTPD_CONF")]
    config: PathBuf,

    /// Log at debug level regardless of the configuration
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = ServerConfig::load(&cli.config)?;
    cfg.debug |= cli.debug;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(if cfg.debug { Level::DEBUG } else { Level::INFO })
        .init();

    let cfg = Arc::new(cfg);

    tokio::select! {
        res = server::listener::run(cfg) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
