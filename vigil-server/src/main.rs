// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Vigil: HTTP traffic recorder
//
//  Capture:   axum middleware, records on response completion
//  History:   bounded in-memory ring, newest first
//  Query API: key-gated history / metrics / analysis
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

mod app;
mod demo;
mod inspect;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use vigil_admin::AdminState;
use vigil_core::config::VigilConfig;

#[derive(Parser, Debug)]
#[command(name = "vigil", version, about = "Vigil: HTTP traffic recorder")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "vigil.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server (default)
    Serve,
    /// Summarize the traffic of a running server
    Inspect(inspect::InspectArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let process_start = Instant::now();
    let cli = Cli::parse();

    // ── Tracing ──
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    if cli.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Some(Command::Inspect(args)) => inspect::run(args).await,
        Some(Command::Serve) | None => serve(&cli.config, process_start).await,
    }
}

async fn serve(config_path: &Path, process_start: Instant) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "Vigil starting");

    // ── Config ──
    let config = if config_path.exists() {
        info!(path = %config_path.display(), "Loading config file");
        VigilConfig::load(Some(config_path))?
    } else {
        info!("No config file found, using defaults and environment");
        VigilConfig::load(None)?
    };
    config.traffic.validate()?;

    if config.auth.uses_default_key() {
        warn!("No access key configured, the built-in default key is in use");
    }

    // ── State + routes ──
    let state = Arc::new(AdminState::from_config(&config).with_started_at(process_start));
    let app = app::build_app(&config, Arc::clone(&state));

    info!(
        capacity = config.traffic.capacity,
        history = %config.traffic.history_path,
        metrics = %config.traffic.metrics_path,
        demo = config.demo.enabled,
        "Vigil is ready, recording traffic"
    );

    vigil_admin::server::serve(app, &config.listen_addr(), shutdown_signal()).await?;

    info!(recorded = state.store.len(), "Vigil stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix (docker stop).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping...");
}
