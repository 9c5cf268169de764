//! PAION Player - Main entry point
//!
//! Starts the local HTTP service, optionally preloads bundles given on the
//! command line, and opens the system browser at the player UI.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paion_player::api::{self, AppContext};
use paion_player::config::Config;
use paion_player::scan::collect_aifm_files;
use paion_player::PlayerState;

/// Command-line arguments for paion-player
#[derive(Parser, Debug)]
#[command(name = "paion-player")]
#[command(about = "Local web player and verifier for AIFM bundles")]
#[command(version)]
struct Args {
    /// Host to bind (falls back to config file, then 127.0.0.1)
    #[arg(long, env = "PAION_HOST")]
    host: Option<String>,

    /// Port to listen on (falls back to config file, then 5050)
    #[arg(short, long, env = "PAION_PORT")]
    port: Option<u16>,

    /// Do not auto-open the browser
    #[arg(long)]
    no_browser: bool,

    /// .aifm files or folders to load at startup
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paion_player=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments and resolve configuration
    let args = Args::parse();
    let config = Config::resolve(args.host, args.port, args.no_browser);

    info!(
        "Starting PAION Player on {}:{}",
        config.host, config.port
    );

    // Initialize shared state
    let state = Arc::new(PlayerState::new().context("Failed to initialize player state")?);

    // Preload any bundles given on the command line
    if !args.paths.is_empty() {
        let inputs = args.paths.clone();
        let found = tokio::task::spawn_blocking(move || collect_aifm_files(&inputs))
            .await
            .context("Startup scan failed")?;
        if found.is_empty() {
            warn!("No .aifm files found in startup paths");
        } else {
            let count = state.load_tracks(found).await;
            info!(count, "Preloaded playlist from command line");
        }
    }

    // Build the application router
    let app = api::create_router(AppContext {
        state: Arc::clone(&state),
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Player UI available at http://{}", addr);

    if config.open_browser {
        spawn_browser_open(addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Open the system browser at the player UI, slightly delayed so the server
/// is listening first
fn spawn_browser_open(addr: SocketAddr) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(800)).await;
        let url = format!("http://{addr}");
        if let Err(e) = open::that(&url) {
            warn!("Failed to open browser at {}: {}", url, e);
        }
    });
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
