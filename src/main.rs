//! Conditional Mock Server - CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use conditional_mock_server::config::{resolve_config_path, DEFAULT_CONFIG_FILE};
use conditional_mock_server::{MockServer, MockServerConfig};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "conditional-mock-server",
    about = "Mock API server - responses selected by query, header and payload conditions",
    version
)]
struct Args {
    /// Path to configuration file, relative paths resolve against the executable's folder
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the configured listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print an example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        println!("{}", include_str!("../config.example.yaml"));
        return Ok(());
    }

    let path = resolve_config_path(&args.config);
    info!(path = %path.display(), "Loading configuration");
    let mut config = MockServerConfig::from_file(&path)
        .with_context(|| format!("Could not load the configuration from {}", path.display()))?;

    if args.validate {
        println!(
            "Configuration is valid ({} endpoints defined)",
            config.endpoints.len()
        );
        return Ok(());
    }

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let address = config.listen_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    MockServer::new(config).run(listener).await?;

    Ok(())
}
