//! Main entry point for the matchmaker service
//!
//! Loads configuration, initializes logging, serves the matchmaking API and
//! shuts down gracefully on SIGINT/SIGTERM.

use anyhow::Result;
use clap::Parser;
use matchmaker::config::{validate_config, AppConfig};
use matchmaker::service::AppState;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};

/// Matchmaker - allocates queued players to registered game servers
#[derive(Parser)]
#[command(
    name = "matchmaker",
    version,
    about = "Matchmaking service allocating queued players to registered game servers",
    long_about = "Game servers register and heartbeat over HTTP; clients enqueue and poll until \
                 they are seated on an open server with matching game mode, region and version. \
                 Stale servers and players who never join are expired lazily on each poll."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// HTTP port override
    #[arg(long, value_name = "PORT", help = "Override HTTP server port")]
    http_port: Option<u16>,

    /// Heartbeat timeout override
    #[arg(
        long,
        value_name = "SECONDS",
        help = "Seconds without a heartbeat before a server is expired"
    )]
    heartbeat_timeout: Option<u64>,

    /// Join timeout override
    #[arg(
        long,
        value_name = "SECONDS",
        help = "Seconds a matched player has to join before being removed"
    )]
    join_timeout: Option<u64>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("Matchmaker service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Listening on: {}", config.http_address());
    info!(
        "   Heartbeat timeout: {}s",
        config.matchmaking.heartbeat_timeout_seconds
    );
    info!(
        "   Join timeout: {}s",
        config.matchmaking.join_timeout_seconds
    );
    info!(
        "   Assign player ids: {}",
        config.matchmaking.assign_player_ids
    );
}

/// Load configuration from file or environment, then apply CLI overrides
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(http_port) = args.http_port {
        config.http.port = http_port;
    }

    if let Some(timeout) = args.heartbeat_timeout {
        config.matchmaking.heartbeat_timeout_seconds = timeout;
    }

    if let Some(timeout) = args.join_timeout {
        config.matchmaking.join_timeout_seconds = timeout;
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // CLI args override environment/config file
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    let mut app_state = match AppState::new(config.clone()).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app_state.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    info!("Matchmaker is running, press Ctrl+C to shut down");

    wait_for_shutdown_signal().await;

    info!("Shutdown signal received, beginning graceful shutdown...");

    match tokio::time::timeout(config.shutdown_timeout(), app_state.shutdown()).await {
        Ok(Ok(())) => info!("Graceful shutdown completed successfully"),
        Ok(Err(e)) => warn!("Shutdown completed with errors: {}", e),
        Err(_) => warn!("Shutdown timeout exceeded, forcing exit"),
    }

    info!("Matchmaker stopped");
    Ok(())
}
