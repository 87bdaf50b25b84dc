//! CLI error types and conversions

use crate::browser::ProbeError;
use crate::config::ConfigError;
use crate::sync::{StoreError, SyncError};
use crate::HourRangeError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Browser probe/actuation error
    #[error("browser error: {0}")]
    Probe(#[from] ProbeError),

    /// Storage error
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Per-bucket sync error
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Hour range error
    #[error("hour range error: {0}")]
    HourRange(#[from] HourRangeError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
