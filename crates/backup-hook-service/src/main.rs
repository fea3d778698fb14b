//! Backup hook service - signed webhook that triggers the backup script.
//!
//! This is the main entry point for the backup-hook service.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use backup_hook_core::HookConfig;
use backup_hook_service::{create_router, AppState};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the backup config file.
    #[arg(short, long, env = "BACKUP_HOOK_CONFIG", default_value = "backup.conf")]
    config: PathBuf,

    /// Log output format.
    #[arg(long, env = "BACKUP_HOOK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

/// How log events are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let fmt_layer = match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,backup_hook=debug".into()),
        )
        .with(fmt_layer)
        .init();

    tracing::info!("Starting backup hook service");

    // Configuration problems are fatal
    let config = HookConfig::load(&cli.config).map_err(|e| {
        tracing::error!(path = %cli.config.display(), error = %e, "Failed to load config");
        e
    })?;

    let listen_addr = config.listen_addr();
    tracing::info!(
        path = %cli.config.display(),
        listen_addr = %listen_addr,
        max_body_bytes = config.max_body_bytes,
        max_concurrent_backups = config.max_concurrent_backups,
        "Service configuration loaded"
    );

    let state = AppState::new(config);
    let app = create_router(state);

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
