//! Validation subcommand: integrity checks over stored bucket files.

use crate::snapshot::Fingerprint;
use clap::Parser;
use std::path::{Path, PathBuf};

use super::CliError;

/// Validate command for checking the stored bucket tree
#[derive(Parser, Debug)]
pub struct ValidateCommand {
    /// Output directory to validate
    #[arg(long, default_value = "data")]
    pub output: PathBuf,

    /// Print per-file fingerprints
    #[arg(long, default_value_t = false)]
    pub fingerprints: bool,
}

impl ValidateCommand {
    /// Walk the output tree and re-parse every bucket file.
    pub fn execute(&self) -> Result<(), CliError> {
        if !self.output.exists() {
            println!("No output directory at {}", self.output.display());
            return Ok(());
        }

        let mut valid_count = 0u32;
        let mut invalid_count = 0u32;

        for date_dir in sorted_entries(&self.output)? {
            if !date_dir.is_dir() {
                continue;
            }
            for file in sorted_entries(&date_dir)? {
                let name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if !name.starts_with("hour_") || !name.ends_with(".csv") {
                    continue;
                }
                match self.check_bucket_file(&file) {
                    Ok(report) => {
                        println!("  {} ({report})", file.display());
                        valid_count += 1;
                    }
                    Err(reason) => {
                        println!("  {} (INVALID: {reason})", file.display());
                        invalid_count += 1;
                    }
                }
            }
        }

        println!("\nSummary:");
        println!("  Valid files: {valid_count}");
        if invalid_count > 0 {
            println!("  Invalid files: {invalid_count}");
            return Err(CliError::InvalidArgument(format!(
                "found {invalid_count} invalid bucket file(s)"
            )));
        }
        Ok(())
    }

    /// One bucket file: must be readable, consistently-shaped CSV.
    fn check_bucket_file(&self, path: &Path) -> Result<String, String> {
        let content = std::fs::read_to_string(path).map_err(|e| format!("cannot read: {e}"))?;

        let mut reader = csv::ReaderBuilder::new()
            .flexible(false)
            .from_reader(content.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| format!("bad header: {e}"))?
            .len();
        let mut records = 0usize;
        for record in reader.records() {
            record.map_err(|e| format!("bad record: {e}"))?;
            records += 1;
        }

        let mut report = format!("{headers} columns, {records} records");
        if self.fingerprints {
            report.push_str(&format!(
                ", fingerprint {}",
                Fingerprint::of(content.as_bytes())
            ));
        }
        Ok(report)
    }
}

/// Directory entries, sorted for stable output.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| CliError::InvalidArgument(format!("cannot read {}: {e}", dir.display())))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();
    Ok(entries)
}
