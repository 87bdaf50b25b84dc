//! Sync command implementation

use crate::browser::DashboardPage;
use crate::config::AppConfig;
use crate::shutdown::SharedShutdown;
use crate::sync::{FsBucketStore, SyncDriver};
use crate::HourRange;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use super::{CliError, ValidateCommand};

/// RouterSense dashboard sync CLI
#[derive(Parser, Debug)]
#[command(name = "routersense-sync")]
#[command(about = "Sync hourly telemetry from the RouterSense dashboard", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the JSON config file
    #[arg(long, global = true, default_value = "config.json")]
    pub config: PathBuf,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Seek, scrape, and reconcile a date range of hourly buckets
    Sync(SyncArgs),
    /// Validate previously stored bucket files
    Validate(ValidateCommand),
}

/// Arguments for the sync command
#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Start date (YYYY-MM-DD); defaults to the config's default start date
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), inclusive; defaults to start
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Hour subrange of each date, as H or H-H (e.g. 8-23)
    #[arg(long, default_value = "0-23")]
    pub hours: String,

    /// Output directory; overrides the config's output dir
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// WebDriver endpoint to drive the browser through
    #[arg(long, default_value = "http://localhost:4444")]
    pub webdriver: String,

    /// Run the browser headless
    #[arg(long, default_value_t = false)]
    pub headless: bool,

    /// Show a progress bar over the bucket queue
    #[arg(long, default_value_t = true)]
    pub progress: bool,
}

impl SyncArgs {
    /// Resolve dates from arguments and config defaults.
    fn resolve_range(&self, config: &AppConfig) -> Result<(NaiveDate, NaiveDate), CliError> {
        let start = self
            .start
            .or(config.download.default_start_date)
            .ok_or_else(|| {
                CliError::InvalidArgument(
                    "no start date: pass --start or set download.defaultStartDate".to_string(),
                )
            })?;
        let end = self.end.or(config.download.default_end_date).unwrap_or(start);
        if end < start {
            return Err(CliError::InvalidArgument(format!(
                "end date {end} is before start date {start}"
            )));
        }
        Ok((start, end))
    }

    /// Execute the sync command.
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let config = AppConfig::load(&cli.config)?;
        let (start, end) = self.resolve_range(&config)?;
        let hours: HourRange = self.hours.parse()?;
        let output_dir = self
            .output
            .clone()
            .unwrap_or_else(|| config.download.output_dir.clone());

        info!(
            %start, %end,
            hours = %format!("{}-{}", hours.start(), hours.end()),
            output = %output_dir.display(),
            "sync starting"
        );

        let page = DashboardPage::connect(&self.webdriver, &config, self.headless).await?;
        let store = FsBucketStore::new(output_dir);

        let result = SyncDriver::new(&page, &store)
            .with_hours(hours)
            .with_shutdown(shutdown)
            .with_progress(self.progress)
            .sync_range(start, end)
            .await;

        // Always try to end the session, but report the sync error first.
        let close_result = page.close().await;
        let summary = result?;
        close_result?;

        println!("{summary}");
        Ok(())
    }
}
