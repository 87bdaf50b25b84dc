//! Main entry point for the routersense-sync CLI

use clap::Parser;
use routersense_sync::cli::{Cli, Commands};
use routersense_sync::shutdown::{self, ShutdownFlag};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("routersense_sync=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    // Ctrl+C abandons the remaining bucket queue; the bucket in flight
    // finishes so no partial write can happen.
    let shutdown = ShutdownFlag::shared();
    shutdown::set_global(shutdown.clone());
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - finishing current bucket, then stopping");
                shutdown.request();
            }
        }
    });

    let result = match cli.command {
        Commands::Sync(ref args) => args.execute(&cli, shutdown.clone()).await,
        Commands::Validate(ref cmd) => cmd.execute(),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}
