//! ChatRelay Server Binary
//!
//! Relays chat messages between TCP clients and keeps a sorted message log.

use chatrelay::config::ServerConfig;
use chatrelay::server::ChatServer;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "chatrelay-server")]
#[command(about = "Minimal TCP chat relay with a sorted message log")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/server.toml")]
    config: PathBuf,

    /// Interface to bind to
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Bytes per socket read
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Message log file
    #[arg(short, long)]
    log_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(if args.verbose {
            "chatrelay=debug,info"
        } else {
            "chatrelay=info,warn,error"
        })
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting ChatRelay Server v{}", env!("CARGO_PKG_VERSION"));

    // File first, then CHATRELAY__* environment, then flags
    let config_file = if args.config.exists() {
        Some(args.config.as_path())
    } else {
        info!("Config file not found, using defaults");
        None
    };
    let mut config = ServerConfig::load(config_file)?;

    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(buffer_size) = args.buffer_size {
        config.server.buffer_size = buffer_size;
    }
    if let Some(log_path) = args.log_path {
        config.storage.log_path = log_path;
    }

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(2);
    }

    info!("Configuration loaded successfully");
    info!("Listen address: {}:{}", config.server.bind_address, config.server.port);
    info!("Buffer size: {} bytes", config.server.buffer_size);
    info!("Message log: {}", config.storage.log_path.display());

    let server = ChatServer::new(config).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    tokio::select! {
        result = server.start() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        _ = shutdown_signal => {
            info!("Shutting down gracefully...");
            server.shutdown();
        }
    }

    info!("ChatRelay Server stopped");
    Ok(())
}
