//! Trigger a backup through a running backup-hook service.
//!
//! Reads the shared secret from the same config file as the service, signs
//! `{"args": [...]}` and prints the script output.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backup_hook_client::BackupHookClient;
use backup_hook_core::HookConfig;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the backup config file holding `callback_secret`.
    #[arg(short, long, env = "BACKUP_HOOK_CONFIG", default_value = "backup.conf")]
    config: PathBuf,

    /// Service base URL; `/backup` is appended (default: `http://localhost:<port from config>`).
    #[arg(short, long, env = "BACKUP_HOOK_URL")]
    url: Option<String>,

    /// Arguments forwarded to the backup script.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = HookConfig::load(&cli.config)?;
    let url = cli.url.unwrap_or_else(|| default_base_url(config.port));

    let client = BackupHookClient::new(url, config.secret)?;
    let response = client.trigger(cli.args).await?;

    println!("{}", response.message);
    if !response.output.is_empty() {
        print!("{}", response.output);
    }

    Ok(())
}

/// Base URL of a service on this host.
fn default_base_url(port: u16) -> String {
    format!("http://localhost:{port}")
}
