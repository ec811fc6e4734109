//! Session relay service.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                SESSION RELAY                  │
//!   Gateway-authed       │  ┌──────┐   ┌─────────┐   ┌──────────┐       │
//!   request  ────────────┼─▶│ CORS │──▶│ context │──▶│ handlers │       │
//!   (X-User-Id,          │  └──────┘   │ propag. │   └────┬─────┘       │
//!    X-User-Data)        │             └─────────┘        │             │
//!                        │                                ▼             │
//!                        │                      ┌──────────────────┐    │
//!                        │                      │ credential fwd   │────┼──▶ Gateway
//!                        │                      │ cookie | bearer  │    │
//!                        │                      └──────────────────┘    │
//!                        │  ┌──────────┐  ┌──────────┐  ┌────────────┐  │
//!                        │  │  config  │  │ storage  │  │ SPA assets │  │
//!                        │  └──────────┘  └──────────┘  └────────────┘  │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use session_relay::config::{load_env_file, resolve_config};
use session_relay::http::{shutdown_signal, HttpServer};
use session_relay::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "session-relay")]
#[command(about = "Identity-propagating application server behind an auth gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server
    Run {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show version information
    Version,
}

fn print_version() {
    println!("session-relay");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Commit: {}", option_env!("BUILD_COMMIT").unwrap_or("none"));
    println!("Build Date: {}", option_env!("BUILD_DATE").unwrap_or("unknown"));
    println!("Build OS: {}", std::env::consts::OS);
    println!("Build Arch: {}", std::env::consts::ARCH);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = match cli.command {
        Commands::Version => {
            print_version();
            return Ok(());
        }
        Commands::Run { config } => config,
    };

    // A missing .env file is normal outside local development.
    let env_file_loaded = load_env_file(Path::new(".env"));

    let config = resolve_config(config_path.as_deref())?;
    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "session-relay starting");
    if env_file_loaded {
        tracing::info!("Loaded environment from .env");
    }
    tracing::info!(
        bind_address = %config.listener.bind_address,
        gateway = %config.gateway.base_url,
        admin_token_set = !config.gateway.admin_token.is_empty(),
        request_timeout_secs = config.timeouts.request_secs,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
